//! Blocking HTTP helpers shared by the fetchers and sources

use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use ureq::Agent;

/// Sent with every request, some of the free APIs reject anonymous clients.
pub const USER_AGENT: &str = concat!("frankenbot/", env!("CARGO_PKG_VERSION"));

/// Builds an agent whose calls give up after `timeout`.
pub fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// GETs `url` and parses the body as JSON, `None` on any failure.
pub fn get_json(agent: &Agent, url: &str) -> Option<Value> {
    let mut response = match agent.get(url).header("User-Agent", USER_AGENT).call() {
        Ok(response) => response,
        Err(err) => {
            debug!("GET {} failed: {}", url, err);
            return None;
        }
    };
    match response.body_mut().read_json::<Value>() {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("GET {} returned something that isn't JSON: {}", url, err);
            None
        }
    }
}
