//! Config handling

use std::path::PathBuf;

use tracing::log::LevelFilter;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("ureq", LevelFilter::Warn)
            .with_module_level("ureq_proto", LevelFilter::Warn);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Where the source images come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageMode {
    /// The public cat/dog/meme/picsum APIs
    #[default]
    Safe,
    /// An operator supplied URL, URL list or JSON API. Animal pictures are refused.
    Unrestricted(Option<String>),
}

impl ImageMode {
    /// True when the animal policy applies.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted(_))
    }
}

/// API keys for posting to Twitter/X.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    /// Consumer key
    pub api_key: String,
    /// Consumer secret
    pub api_secret: String,
    /// User access token
    pub access_token: String,
    /// User access token secret
    pub access_secret: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

impl TwitterCredentials {
    /// Only returns credentials when every one of them is set.
    pub fn from_parts(
        api_key: Option<&str>,
        api_secret: Option<&str>,
        access_token: Option<&str>,
        access_secret: Option<&str>,
    ) -> Option<Self> {
        let present = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            api_key: present(api_key)?,
            api_secret: present(api_secret)?,
            access_token: present(access_token)?,
            access_secret: present(access_secret)?,
        })
    }
}

/// Everything a run needs to know, resolved from the command line and environment.
#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Debug logging
    pub debug: bool,
    /// Where the final PNG is written
    pub output_path: PathBuf,
    /// TrueType font for the text overlay
    pub font_path: Option<PathBuf>,
    /// Where images come from
    pub image_mode: ImageMode,
    /// Set when all four credentials are configured
    pub credentials: Option<TwitterCredentials>,
    /// False when publishing was switched off on the command line
    pub publish: bool,
}

impl BotConfig {
    /// Resolves the parsed options.
    pub fn from_cli(cli: &CliOptions) -> Self {
        let image_mode = if cli.nsfw_allow {
            ImageMode::Unrestricted(
                cli.nsfw_image_source
                    .as_deref()
                    .map(str::trim)
                    .filter(|source| !source.is_empty())
                    .map(str::to_string),
            )
        } else {
            ImageMode::Safe
        };
        Self {
            debug: cli.debug,
            output_path: cli.output.clone(),
            font_path: cli.font.clone(),
            image_mode,
            credentials: TwitterCredentials::from_parts(
                cli.twitter_api_key.as_deref(),
                cli.twitter_api_secret.as_deref(),
                cli.twitter_access_token.as_deref(),
                cli.twitter_access_secret.as_deref(),
            ),
            publish: !cli.no_publish,
        }
    }

    /// Credentials to post with, unless publishing is off.
    pub fn publish_credentials(&self) -> Option<&TwitterCredentials> {
        match self.publish {
            true => self.credentials.as_ref(),
            false => None,
        }
    }
}
