//! CLI parser
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::constants::DEFAULT_OUTPUT_PATH;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(
        long,
        help = "Enable debug logging",
        env = "FRANKENBOT_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    /// Enable debug logging. Env: FRANKENBOT_DEBUG
    pub debug: bool,
    #[clap(
        long,
        short,
        default_value_os_t = DEFAULT_OUTPUT_PATH.to_path_buf(),
        env = "FRANKENBOT_OUTPUT"
    )]
    /// Where the finished image is saved, defaults to `output.png`.
    /// Env: FRANKENBOT_OUTPUT
    pub output: PathBuf,
    #[clap(long, short, env = "FRANKENBOT_FONT")]
    /// TrueType font for the overlay text, eg `/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf`.
    /// Falls back to a system DejaVu font, then a built-in bitmap font.
    /// Env: FRANKENBOT_FONT
    pub font: Option<PathBuf>,

    #[clap(
        long,
        env = "NSFW_ALLOW",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true"
    )]
    /// Take images from `--nsfw-image-source` instead of the public APIs.
    /// Animal pictures are refused in this mode. Accepts `true`/`yes`/`on`/`1`
    /// in any case.
    /// Env: NSFW_ALLOW
    pub nsfw_allow: bool,
    #[clap(long, env = "NSFW_IMAGE_SOURCE")]
    /// An image URL, a comma separated list of them, or a JSON API listing them.
    /// Env: NSFW_IMAGE_SOURCE
    pub nsfw_image_source: Option<String>,

    #[clap(long)]
    /// Save the image but never post it.
    pub no_publish: bool,
    #[clap(long, env = "TWITTER_API_KEY", hide_env_values = true)]
    /// Env: TWITTER_API_KEY
    pub twitter_api_key: Option<String>,
    #[clap(long, env = "TWITTER_API_SECRET", hide_env_values = true)]
    /// Env: TWITTER_API_SECRET
    pub twitter_api_secret: Option<String>,
    #[clap(long, env = "TWITTER_ACCESS_TOKEN", hide_env_values = true)]
    /// Env: TWITTER_ACCESS_TOKEN
    pub twitter_access_token: Option<String>,
    #[clap(long, env = "TWITTER_ACCESS_SECRET", hide_env_values = true)]
    /// Env: TWITTER_ACCESS_SECRET
    pub twitter_access_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolish_flags() {
        for value in ["True", "TRUE", "yes", "on", "1"] {
            let arg = format!("--nsfw-allow={value}");
            let cli = CliOptions::try_parse_from(["frankenbot", arg.as_str()])
                .expect("boolish value");
            assert!(cli.nsfw_allow, "{value}");
        }
        for value in ["False", "no", "off", "0"] {
            let arg = format!("--nsfw-allow={value}");
            let cli = CliOptions::try_parse_from(["frankenbot", arg.as_str()])
                .expect("boolish value");
            assert!(!cli.nsfw_allow, "{value}");
        }
        let cli = CliOptions::try_parse_from(["frankenbot", "--nsfw-allow"]).expect("bare flag");
        assert!(cli.nsfw_allow);
        assert!(CliOptions::try_parse_from(["frankenbot", "--nsfw-allow=maybe"]).is_err());
    }

    #[test]
    fn test_default_output() {
        let cli = CliOptions::try_parse_from(["frankenbot"]).expect("no arguments needed");
        assert_eq!(cli.output, *DEFAULT_OUTPUT_PATH);
    }
}
