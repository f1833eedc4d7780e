//! Posting the finished image

pub mod oauth;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ureq::Agent;

use crate::config::TwitterCredentials;
use crate::constants::PUBLISH_TIMEOUT;
use crate::http::{USER_AGENT, agent};
pub use oauth::OAuthSigner;

/// Media upload endpoint (v1.1, still the only way to attach images).
pub const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

/// Post creation endpoint.
pub const CREATE_POST_URL: &str = "https://api.twitter.com/2/tweets";

const JPEG_QUALITY: u8 = 90;

/// What a successful post hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostReceipt {
    /// The platform's id for the new post
    pub id: String,
}

/// Why a post didn't go out.
#[derive(Debug)]
pub enum PublishError {
    /// The image couldn't be turned into a JPEG
    Encode(image::ImageError),
    /// Building the OAuth signature failed
    Signing(String),
    /// The request never got an answer, or got an error status
    Http(Box<ureq::Error>),
    /// The answer didn't have the field we need
    UnexpectedResponse(String),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "Failed to encode image: {err}"),
            Self::Signing(message) => write!(f, "Failed to sign request: {message}"),
            Self::Http(err) => write!(f, "Request failed: {err}"),
            Self::UnexpectedResponse(message) => write!(f, "Unexpected response: {message}"),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<image::ImageError> for PublishError {
    fn from(err: image::ImageError) -> Self {
        PublishError::Encode(err)
    }
}

impl From<ureq::Error> for PublishError {
    fn from(err: ureq::Error) -> Self {
        PublishError::Http(Box::new(err))
    }
}

/// Somewhere to post a captioned image.
pub trait Publisher {
    /// Posts the image with `caption` as its text.
    fn publish(&self, image: &RgbImage, caption: &str) -> Result<PostReceipt, PublishError>;
}

/// Encodes the image as a JPEG.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, PublishError> {
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY).encode_image(image)?;
    Ok(output)
}

/// Posts to Twitter/X: uploads the media, then creates a post that references it.
#[derive(Clone)]
pub struct TwitterPublisher {
    signer: OAuthSigner,
    agent: Agent,
    upload_url: String,
    post_url: String,
}

impl TwitterPublisher {
    /// Posts to the real endpoints.
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self::with_endpoints(credentials, MEDIA_UPLOAD_URL, CREATE_POST_URL)
    }

    /// Posts somewhere else, handy for testing against a local server.
    pub fn with_endpoints(credentials: TwitterCredentials, upload_url: &str, post_url: &str) -> Self {
        Self {
            signer: OAuthSigner::new(credentials),
            agent: agent(PUBLISH_TIMEOUT),
            upload_url: upload_url.to_string(),
            post_url: post_url.to_string(),
        }
    }

    /// Uploads the JPEG and returns the media id.
    fn upload_media(&self, jpeg: &[u8]) -> Result<String, PublishError> {
        let media_data = STANDARD.encode(jpeg);
        let authorization = self
            .signer
            .authorization("POST", &self.upload_url, &[("media_data", media_data.as_str())])?;
        debug!("Uploading {} bytes of media", jpeg.len());
        let mut response = self
            .agent
            .post(&self.upload_url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", authorization.as_str())
            .send_form([("media_data", media_data.as_str())])?;
        let body: MediaUploadResponse = response.body_mut().read_json()?;
        body.media_id()
    }

    fn create_post(&self, caption: &str, media_id: &str) -> Result<PostReceipt, PublishError> {
        let authorization = self.signer.authorization("POST", &self.post_url, &[])?;
        let mut response = self
            .agent
            .post(&self.post_url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", authorization.as_str())
            .send_json(CreatePost {
                text: caption,
                media: PostMedia {
                    media_ids: [media_id],
                },
            })?;
        let body: CreatePostResponse = response.body_mut().read_json()?;
        body.receipt()
    }
}

impl Publisher for TwitterPublisher {
    fn publish(&self, image: &RgbImage, caption: &str) -> Result<PostReceipt, PublishError> {
        let jpeg = encode_jpeg(image)?;
        let media_id = self.upload_media(&jpeg)?;
        let receipt = self.create_post(caption, &media_id)?;
        info!("Posted {}", receipt.id);
        Ok(receipt)
    }
}

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
    media: PostMedia<'a>,
}

#[derive(Serialize)]
struct PostMedia<'a> {
    media_ids: [&'a str; 1],
}

/// `{"media_id_string": ...}`, older responses only carry the numeric `media_id`
#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: Option<String>,
    media_id: Option<u64>,
}

impl MediaUploadResponse {
    fn media_id(self) -> Result<String, PublishError> {
        self.media_id_string
            .filter(|id| !id.is_empty())
            .or_else(|| self.media_id.map(|id| id.to_string()))
            .ok_or_else(|| PublishError::UnexpectedResponse("no media id".to_string()))
    }
}

/// `{"data": {"id": ...}}`
#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: Option<CreatedPost>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

impl CreatePostResponse {
    fn receipt(self) -> Result<PostReceipt, PublishError> {
        self.data
            .map(|post| PostReceipt { id: post.id })
            .ok_or_else(|| PublishError::UnexpectedResponse("no post id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use serde_json::json;

    fn credentials() -> TwitterCredentials {
        TwitterCredentials {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            access_token: "token".to_string(),
            access_secret: "token-secret".to_string(),
        }
    }

    #[test]
    fn test_encode_jpeg() {
        let image = RgbImage::from_pixel(64, 48, Rgb([200, 30, 30]));
        let jpeg = encode_jpeg(&image).expect("encodes");
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&jpeg).expect("decodes");
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_response_ids() {
        let upload: MediaUploadResponse = serde_json::from_value(json!({
            "media_id": 710511363345354753_u64,
            "media_id_string": "710511363345354753",
            "expires_after_secs": 86400
        }))
        .expect("parses");
        assert_eq!(upload.media_id().expect("has id"), "710511363345354753");

        let numeric: MediaUploadResponse =
            serde_json::from_value(json!({"media_id": 12_u64})).expect("parses");
        assert_eq!(numeric.media_id().expect("has id"), "12");

        let missing: MediaUploadResponse =
            serde_json::from_value(json!({"errors": []})).expect("parses");
        assert!(matches!(
            missing.media_id(),
            Err(PublishError::UnexpectedResponse(_))
        ));

        let post: CreatePostResponse = serde_json::from_value(json!({
            "data": {"id": "1445880548472328192", "text": "hi"}
        }))
        .expect("parses");
        assert_eq!(
            post.receipt().expect("has id"),
            PostReceipt {
                id: "1445880548472328192".to_string()
            }
        );
        let refused: CreatePostResponse =
            serde_json::from_value(json!({"title": "Unauthorized"})).expect("parses");
        assert!(refused.receipt().is_err());
    }

    #[test]
    fn test_post_body_shape() {
        let body = serde_json::to_value(CreatePost {
            text: "hello",
            media: PostMedia { media_ids: ["42"] },
        })
        .expect("serializes");
        assert_eq!(body, json!({"text": "hello", "media": {"media_ids": ["42"]}}));
    }

    #[test]
    fn test_unreachable_endpoint_fails() {
        let _ = crate::config::setup_logging(true);
        let publisher = TwitterPublisher::with_endpoints(
            credentials(),
            "http://127.0.0.1:9/upload",
            "http://127.0.0.1:9/post",
        );
        let image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        assert!(matches!(
            publisher.publish(&image, "hello"),
            Err(PublishError::Http(_))
        ));
    }
}
