//! One pass of the bot: find images, mash them up, caption, save and post.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use rand::{Rng, RngCore};
use tracing::{debug, info, warn};

use crate::annotate::{CaptionFont, annotate};
use crate::caption::build_caption;
use crate::compose::compose;
use crate::config::BotConfig;
use crate::constants::{CAPTION_QUOTE_CHANCE, IMAGES_PER_RUN, TEXT_OVERLAY_CHANCE};
use crate::error::BotError;
use crate::fetch::{FetchResult, HttpImageFetcher, ImageFetcher};
use crate::policy::refuse_animal_images;
use crate::publish::{PostReceipt, Publisher, TwitterPublisher};
use crate::sources::{ApiImageSource, ApiQuoteSource, ImageSource, QuoteSource};

/// What happened to the post once the image was saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No publisher configured
    Skipped,
    /// Posted successfully
    Posted(PostReceipt),
    /// The platform said no, the run still counts as done
    Failed(String),
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The caption that was (or would have been) posted
    pub caption: String,
    /// Where the image was saved
    pub output_path: PathBuf,
    /// Whether the quote was drawn onto the image
    pub annotated: bool,
    /// What happened when posting
    pub publish: PublishOutcome,
}

/// The whole pipeline, with its collaborators plugged in.
pub struct Bot {
    images: Box<dyn ImageSource>,
    fetcher: Box<dyn ImageFetcher>,
    quotes: Box<dyn QuoteSource>,
    publisher: Option<Box<dyn Publisher>>,
    font: CaptionFont,
    unrestricted: bool,
    output_path: PathBuf,
}

impl Bot {
    /// A bot that saves to `output_path` and doesn't post anywhere.
    pub fn new(
        images: Box<dyn ImageSource>,
        fetcher: Box<dyn ImageFetcher>,
        quotes: Box<dyn QuoteSource>,
        font: CaptionFont,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images,
            fetcher,
            quotes,
            publisher: None,
            font,
            unrestricted: false,
            output_path: output_path.into(),
        }
    }

    /// Posts finished images with `publisher`.
    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Turns the animal policy on or off.
    pub fn unrestricted(mut self, unrestricted: bool) -> Self {
        self.unrestricted = unrestricted;
        self
    }

    /// Wires up the real APIs.
    pub fn from_config(config: &BotConfig) -> Self {
        let bot = Self::new(
            Box::new(ApiImageSource::new(config.image_mode.clone())),
            Box::new(HttpImageFetcher::new()),
            Box::new(ApiQuoteSource::new()),
            CaptionFont::load(config.font_path.as_deref()),
            config.output_path.clone(),
        )
        .unrestricted(config.image_mode.is_unrestricted());
        match config.publish_credentials() {
            Some(credentials) => {
                bot.with_publisher(Box::new(TwitterPublisher::new(credentials.clone())))
            }
            None => {
                info!("No complete set of Twitter credentials, images will only be saved");
                bot
            }
        }
    }

    /// Where the image will be saved.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Runs the pipeline once.
    ///
    /// Anything that goes wrong before the image is saved aborts the run.
    /// A failed post doesn't, it's reported in [RunReport::publish].
    pub fn run(&self, rng: &mut dyn RngCore) -> Result<RunReport, BotError> {
        let urls = self.images.image_urls(IMAGES_PER_RUN, rng)?;
        debug!("Image urls: {:?}", urls);
        if self.unrestricted {
            refuse_animal_images(&urls)?;
        }

        let bitmaps = self.fetch_all(&urls);
        let mut image = compose(bitmaps, rng)?;

        let quote = self.quotes.quote(rng);
        debug!("Quote: {}", quote);

        let annotated = rng.random_bool(TEXT_OVERLAY_CHANCE);
        if annotated {
            image = annotate(image, &quote, &self.font)?;
        }

        let caption_quote = match rng.random_bool(CAPTION_QUOTE_CHANCE) {
            true => quote.as_str(),
            false => " ",
        };
        let caption = build_caption(caption_quote, rng);
        info!("Generated Caption: {}", caption);

        self.save(&image)?;
        info!("Image saved to {}", self.output_path.display());

        let publish = self.publish(&image, &caption);
        Ok(RunReport {
            caption,
            output_path: self.output_path.clone(),
            annotated,
            publish,
        })
    }

    fn fetch_all(&self, urls: &[String]) -> Vec<RgbImage> {
        urls.iter()
            .filter_map(|url| match self.fetcher.fetch(url) {
                FetchResult::Present(image) => Some(image),
                FetchResult::Absent(reason) => {
                    warn!("Skipping {}: {}", url, reason);
                    None
                }
            })
            .collect()
    }

    fn save(&self, image: &RgbImage) -> Result<(), BotError> {
        if let Some(parent) = self
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
        image.save_with_format(&self.output_path, ImageFormat::Png)?;
        Ok(())
    }

    fn publish(&self, image: &RgbImage, caption: &str) -> PublishOutcome {
        let Some(publisher) = &self.publisher else {
            debug!("No publisher, not posting");
            return PublishOutcome::Skipped;
        };
        match publisher.publish(image, caption) {
            Ok(receipt) => PublishOutcome::Posted(receipt),
            Err(err) => {
                warn!("Failed to post: {}", err);
                PublishOutcome::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageMode;

    #[test]
    fn test_from_config_without_credentials() {
        let config = BotConfig {
            debug: true,
            output_path: PathBuf::from("out/bot.png"),
            font_path: None,
            image_mode: ImageMode::Unrestricted(None),
            credentials: None,
            publish: true,
        };
        let bot = Bot::from_config(&config);
        assert!(bot.publisher.is_none());
        assert!(bot.unrestricted);
        assert_eq!(bot.output_path(), Path::new("out/bot.png"));
    }
}
