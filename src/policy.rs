//! Keeping animal pictures out of unrestricted posts

use tracing::warn;
use url::Url;

use crate::constants::ANIMAL_DOMAINS;
use crate::error::BotError;

/// True when `url` points at one of the [ANIMAL_DOMAINS] or a subdomain.
///
/// URLs that don't parse are matched on their raw text instead, so a garbled
/// URL can't sneak past.
pub fn is_animal_url(url: &str) -> bool {
    match Url::parse(url).ok().as_ref().and_then(Url::host_str) {
        Some(host) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            ANIMAL_DOMAINS
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        }
        None => {
            let lowered = url.to_ascii_lowercase();
            ANIMAL_DOMAINS.iter().any(|domain| lowered.contains(domain))
        }
    }
}

/// Fails on the first animal URL.
pub fn refuse_animal_images(urls: &[String]) -> Result<(), BotError> {
    match urls.iter().find(|url| is_animal_url(url)) {
        Some(url) => {
            warn!("Refusing to use animal image in unrestricted mode: {}", url);
            Err(BotError::PolicyViolation(url.clone()))
        }
        None => Ok(()),
    }
}
