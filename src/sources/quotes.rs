//! Quote sources

use rand::RngCore;
use rand::seq::IndexedRandom;
use serde_json::Value;
use tracing::{debug, warn};
use ureq::Agent;

use super::QuoteSource;
use crate::constants::{FALLBACK_QUOTES, QUOTE_API_TIMEOUT};
use crate::http::{agent, get_json};

/// A public quote API and how to turn its response into a one-liner.
#[derive(Clone, Copy, Debug)]
pub struct QuoteApi {
    /// Short name used in logs
    pub name: &'static str,
    /// Endpoint to call
    pub endpoint: &'static str,
    /// Formats the response, `None` when it doesn't look right
    pub parse: fn(&Value) -> Option<String>,
}

/// The quote APIs we pick from.
pub const QUOTE_APIS: &[QuoteApi] = &[
    QuoteApi {
        name: "zenquotes",
        endpoint: "https://zenquotes.io/api/random",
        parse: parse_zenquotes,
    },
    QuoteApi {
        name: "kanye",
        endpoint: "https://api.kanye.rest/",
        parse: parse_kanye,
    },
    QuoteApi {
        name: "adviceslip",
        endpoint: "https://api.adviceslip.com/advice",
        parse: parse_adviceslip,
    },
    QuoteApi {
        name: "forismatic",
        endpoint: "https://api.forismatic.com/api/1.0/?method=getQuote&format=json&lang=en",
        parse: parse_forismatic,
    },
    QuoteApi {
        name: "quotable",
        endpoint: "https://api.quotable.io/random",
        parse: parse_quotable,
    },
];

fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// `[{"q": ..., "a": ...}]`
pub fn parse_zenquotes(value: &Value) -> Option<String> {
    let first = value.get(0)?;
    Some(format!("{} — {}", text(first, "q")?, text(first, "a")?))
}

/// `{"quote": ...}`
pub fn parse_kanye(value: &Value) -> Option<String> {
    Some(format!("“{}” — Kanye West", text(value, "quote")?))
}

/// `{"slip": {"advice": ...}}`
pub fn parse_adviceslip(value: &Value) -> Option<String> {
    Some(format!("Advice: {}", text(value.get("slip")?, "advice")?))
}

/// `{"quoteText": ..., "quoteAuthor": ...}`, the author is often blank
pub fn parse_forismatic(value: &Value) -> Option<String> {
    let quote = text(value, "quoteText")?;
    let author = text(value, "quoteAuthor").unwrap_or("Unknown");
    Some(format!("{quote} — {author}"))
}

/// `{"content": ..., "author": ...}`
pub fn parse_quotable(value: &Value) -> Option<String> {
    Some(format!(
        "{} — {}",
        text(value, "content")?,
        text(value, "author")?
    ))
}

/// One of the built-in quotes.
pub fn fallback_quote(rng: &mut dyn RngCore) -> String {
    FALLBACK_QUOTES
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string()
}

/// Asks a random quote API, falling back to a built-in quote on any failure.
#[derive(Clone)]
pub struct ApiQuoteSource {
    apis: Vec<QuoteApi>,
    agent: Agent,
}

impl ApiQuoteSource {
    /// Uses the stock [QUOTE_APIS].
    pub fn new() -> Self {
        Self::with_apis(QUOTE_APIS.to_vec())
    }

    /// Uses a custom set of APIs.
    pub fn with_apis(apis: Vec<QuoteApi>) -> Self {
        Self {
            apis,
            agent: agent(QUOTE_API_TIMEOUT),
        }
    }
}

impl Default for ApiQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for ApiQuoteSource {
    fn quote(&self, rng: &mut dyn RngCore) -> String {
        if let Some(api) = self.apis.choose(rng) {
            match get_json(&self.agent, api.endpoint).and_then(|json| (api.parse)(&json)) {
                Some(quote) => {
                    debug!("Got a quote from {}", api.name);
                    return quote;
                }
                None => warn!("{} didn't give us a quote, using a fallback", api.name),
            }
        }
        fallback_quote(rng)
    }
}
