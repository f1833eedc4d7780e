//! Downloading and decoding the source images

use std::io::Cursor;

use image::RgbImage;
use tracing::debug;
use ureq::Agent;

use crate::compose::check_scaled_width;
use crate::constants::{IMAGE_FETCH_TIMEOUT, MAX_IMAGE_BYTES};
use crate::http::{USER_AGENT, agent};

/// Outcome of fetching one image.
#[derive(Debug)]
pub enum FetchResult {
    /// The image downloaded and decoded cleanly
    Present(RgbImage),
    /// Nothing usable came back, with the reason why
    Absent(String),
}

impl FetchResult {
    /// Drops the reason, keeping only the image if there was one.
    pub fn into_bitmap(self) -> Option<RgbImage> {
        match self {
            FetchResult::Present(image) => Some(image),
            FetchResult::Absent(_) => None,
        }
    }

    /// True when an image came back.
    pub fn is_present(&self) -> bool {
        matches!(self, FetchResult::Present(_))
    }
}

/// Turns a URL into a bitmap, or explains why it couldn't.
pub trait ImageFetcher {
    /// Fetches a single image. Must never fail loudly, only report absence.
    fn fetch(&self, url: &str) -> FetchResult;
}

/// Fetches images over HTTP.
#[derive(Clone)]
pub struct HttpImageFetcher {
    agent: Agent,
}

impl HttpImageFetcher {
    /// Uses the standard image download timeout.
    pub fn new() -> Self {
        Self {
            agent: agent(IMAGE_FETCH_TIMEOUT),
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|err| err.to_string())?;
        response
            .body_mut()
            .with_config()
            .limit(MAX_IMAGE_BYTES)
            .read_to_vec()
            .map_err(|err| err.to_string())
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> FetchResult {
        match self.download(url) {
            Ok(bytes) => {
                debug!("Downloaded {} bytes from {}", bytes.len(), url);
                decode_bitmap(&bytes)
            }
            Err(err) => FetchResult::Absent(format!("download of {url} failed: {err}")),
        }
    }
}

/// Decodes image bytes of any supported format into RGB.
pub fn decode_bitmap(bytes: &[u8]) -> FetchResult {
    let reader = match image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(err) => return FetchResult::Absent(format!("failed to guess image format: {err}")),
    };
    let image = match reader.decode() {
        Ok(image) => image,
        Err(err) => return FetchResult::Absent(format!("failed to decode image: {err}")),
    };
    if image.width() == 0 || image.height() == 0 {
        return FetchResult::Absent("image has no pixels".to_string());
    }
    let image = image.into_rgb8();
    if let Err(err) = check_scaled_width(&image) {
        return FetchResult::Absent(err.to_string());
    }
    FetchResult::Present(image)
}
