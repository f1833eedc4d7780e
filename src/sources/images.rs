//! Image URL sources

use rand::RngCore;
use rand::seq::IndexedRandom;
use serde_json::{Map, Value};
use tracing::{debug, info};
use ureq::Agent;

use super::ImageSource;
use crate::config::ImageMode;
use crate::constants::IMAGE_API_TIMEOUT;
use crate::error::BotError;
use crate::http::{agent, get_json};

/// How many lookups each requested image may burn before we give up.
const ATTEMPTS_PER_IMAGE: usize = 4;

/// Keys that may hold an image URL in an item of a JSON listing.
const LISTING_KEYS: &[&str] = &["url", "image", "src"];

/// Keys that may hold an image URL in a single JSON object.
const OBJECT_KEYS: &[&str] = &["url", "image", "src", "file"];

/// A public image API and how to dig the image URL out of its response.
#[derive(Clone, Copy, Debug)]
pub struct ImageApi {
    /// Short name used in logs
    pub name: &'static str,
    /// Endpoint to call
    pub endpoint: &'static str,
    /// Extracts the image URL, `None` when the endpoint serves the image itself
    pub parse: Option<fn(&Value) -> Option<String>>,
}

/// The APIs used in safe mode.
pub const IMAGE_APIS: &[ImageApi] = &[
    ImageApi {
        name: "cat",
        endpoint: "https://api.thecatapi.com/v1/images/search",
        parse: Some(parse_cat),
    },
    ImageApi {
        name: "dog",
        endpoint: "https://dog.ceo/api/breeds/image/random",
        parse: Some(parse_dog),
    },
    ImageApi {
        name: "meme",
        endpoint: "https://meme-api.com/gimme",
        parse: Some(parse_meme),
    },
    ImageApi {
        name: "picsum",
        endpoint: "https://picsum.photos/800/600",
        parse: None,
    },
];

fn as_url(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// `[{"url": ...}]`
pub fn parse_cat(value: &Value) -> Option<String> {
    as_url(value.get(0)?.get("url"))
}

/// `{"message": ...}`
pub fn parse_dog(value: &Value) -> Option<String> {
    as_url(value.get("message"))
}

/// `{"url": ...}`, or the biggest of `{"preview": [...]}`
pub fn parse_meme(value: &Value) -> Option<String> {
    as_url(value.get("url")).or_else(|| as_url(value.get("preview")?.as_array()?.last()))
}

/// Pulls every usable URL out of a JSON listing of strings or objects.
pub fn urls_from_listing(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(_) => as_url(Some(item)),
            Value::Object(map) => LISTING_KEYS.iter().find_map(|key| as_url(map.get(*key))),
            _ => None,
        })
        .collect()
}

/// The first recognised image field of a single JSON object.
pub fn url_from_object(map: &Map<String, Value>) -> Option<String> {
    OBJECT_KEYS.iter().find_map(|key| as_url(map.get(*key)))
}

fn pick_urls(candidates: &[String], count: usize, rng: &mut dyn RngCore) -> Vec<String> {
    let mut urls = Vec::with_capacity(count);
    for _ in 0..count {
        if let Some(url) = candidates.choose(rng) {
            urls.push(url.clone());
        }
    }
    urls
}

/// Gets image URLs from public APIs, or from the configured unrestricted source.
#[derive(Clone)]
pub struct ApiImageSource {
    mode: ImageMode,
    apis: Vec<ImageApi>,
    agent: Agent,
}

impl ApiImageSource {
    /// Uses the stock [IMAGE_APIS] in safe mode.
    pub fn new(mode: ImageMode) -> Self {
        Self::with_apis(mode, IMAGE_APIS.to_vec())
    }

    /// Uses a custom set of APIs in safe mode.
    pub fn with_apis(mode: ImageMode, apis: Vec<ImageApi>) -> Self {
        Self {
            mode,
            apis,
            agent: agent(IMAGE_API_TIMEOUT),
        }
    }

    fn lookup(&self, api: &ImageApi) -> Option<String> {
        let Some(parse) = api.parse else {
            return Some(api.endpoint.to_string());
        };
        let json = get_json(&self.agent, api.endpoint)?;
        parse(&json)
    }

    fn safe_urls(&self, count: usize, rng: &mut dyn RngCore) -> Result<Vec<String>, BotError> {
        let mut urls = Vec::with_capacity(count);
        for _ in 0..count.saturating_mul(ATTEMPTS_PER_IMAGE) {
            if urls.len() >= count {
                break;
            }
            let Some(api) = self.apis.choose(rng) else {
                break;
            };
            match self.lookup(api) {
                Some(url) => {
                    debug!("{} api gave us {}", api.name, url);
                    urls.push(url);
                }
                None => debug!("{} api gave us nothing usable, trying another", api.name),
            }
        }
        if urls.is_empty() {
            return Err(BotError::NoImageUrls(
                "none of the image APIs returned a usable URL".to_string(),
            ));
        }
        Ok(urls)
    }

    fn unrestricted_urls(
        &self,
        source: &str,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, BotError> {
        if source.contains(',') {
            let candidates: Vec<String> = source
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
            if candidates.is_empty() {
                return Err(BotError::NoImageUrls(
                    "unrestricted image source list is empty".to_string(),
                ));
            }
            return Ok(pick_urls(&candidates, count, rng));
        }

        match get_json(&self.agent, source) {
            Some(Value::Array(items)) => {
                let candidates = urls_from_listing(&items);
                if candidates.is_empty() {
                    return Err(BotError::NoImageUrls(
                        "unrestricted image API returned no usable URLs".to_string(),
                    ));
                }
                Ok(pick_urls(&candidates, count, rng))
            }
            Some(Value::Object(map)) => url_from_object(&map).map(|url| vec![url]).ok_or_else(|| {
                BotError::NoImageUrls(
                    "unrestricted image API JSON didn't include a recognized image field"
                        .to_string(),
                )
            }),
            _ => {
                info!("Using unrestricted image source directly");
                Ok(vec![source.to_string(); count])
            }
        }
    }
}

impl ImageSource for ApiImageSource {
    fn image_urls(&self, count: usize, rng: &mut dyn RngCore) -> Result<Vec<String>, BotError> {
        let mut urls = match &self.mode {
            ImageMode::Safe => self.safe_urls(count, rng)?,
            ImageMode::Unrestricted(Some(source)) if !source.trim().is_empty() => {
                self.unrestricted_urls(source.trim(), count, rng)?
            }
            ImageMode::Unrestricted(_) => {
                return Err(BotError::Config(
                    "unrestricted mode enabled but no image source is provided".to_string(),
                ));
            }
        };
        urls.truncate(count);
        Ok(urls)
    }
}
