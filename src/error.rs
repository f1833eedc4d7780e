//! Error handling

use crate::annotate::AnnotateError;
use crate::compose::ComposeError;

/// Everything that can stop a run of the bot.
#[derive(Debug)]
pub enum BotError {
    /// The image source could not come up with a single usable URL
    NoImageUrls(String),
    /// An animal picture turned up while running in unrestricted mode
    PolicyViolation(String),
    /// Mixing the images failed
    Compose(ComposeError),
    /// Drawing the quote onto the image failed
    Annotate(AnnotateError),
    /// Reading or writing files
    Io(std::io::Error),
    /// Encoding or decoding an image
    Image(image::ImageError),
    /// The configuration doesn't make sense
    Config(String),
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoImageUrls(reason) => write!(f, "Failed to get image urls: {reason}"),
            Self::PolicyViolation(url) => write!(
                f,
                "Refusing to use animal image in unrestricted mode: {url}"
            ),
            Self::Compose(err) => write!(f, "Image mixing failed: {err}"),
            Self::Annotate(err) => write!(f, "Text overlay failed: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Image(err) => write!(f, "Image error: {err}"),
            Self::Config(message) => write!(f, "Configuration error: {message}"),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compose(err) => Some(err),
            Self::Annotate(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ComposeError> for BotError {
    fn from(err: ComposeError) -> Self {
        BotError::Compose(err)
    }
}

impl From<AnnotateError> for BotError {
    fn from(err: AnnotateError) -> Self {
        BotError::Annotate(err)
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Io(err)
    }
}

impl From<image::ImageError> for BotError {
    fn from(err: image::ImageError) -> Self {
        BotError::Image(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_sources_are_chained() {
        let err = BotError::from(ComposeError::NoImagesAvailable);
        assert_eq!(err.to_string(), "Image mixing failed: Failed to download images");
        assert!(err.source().is_some());

        let err = BotError::from(std::io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
        assert!(err.source().is_some());

        assert!(BotError::Config("no source".to_string()).source().is_none());
    }
}
