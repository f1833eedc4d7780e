//! Where image URLs and quotes come from.
//!
//! Each upstream API answers with its own JSON shape, so every API gets a small
//! parser and lives in a registry table next to its endpoint.

pub mod images;
pub mod quotes;

use rand::RngCore;

use crate::error::BotError;

pub use images::{ApiImageSource, IMAGE_APIS, ImageApi};
pub use quotes::{ApiQuoteSource, QUOTE_APIS, QuoteApi, fallback_quote};

/// Supplies the URLs of the images to mash together.
pub trait ImageSource {
    /// Returns between one and `count` URLs, or an error when none could be found.
    fn image_urls(&self, count: usize, rng: &mut dyn RngCore) -> Result<Vec<String>, BotError>;
}

/// Supplies the quote for the caption.
pub trait QuoteSource {
    /// Always returns something, falling back to a built-in quote.
    fn quote(&self, rng: &mut dyn RngCore) -> String;
}
