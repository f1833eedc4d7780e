//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;

use super::PublishError;
use crate::config::TwitterCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Everything except the RFC 3986 unreserved characters gets encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes the way OAuth wants it.
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// A fresh random nonce.
pub fn nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Signs requests on behalf of one user.
#[derive(Clone)]
pub struct OAuthSigner {
    credentials: TwitterCredentials,
}

impl OAuthSigner {
    /// Signs with the given keys.
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self { credentials }
    }

    fn oauth_params(&self, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
        vec![
            (
                "oauth_consumer_key".to_string(),
                self.credentials.api_key.clone(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                "HMAC-SHA1".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.credentials.access_token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    /// The signature base string: method, URL and the sorted, encoded parameters.
    pub fn base_string(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> String {
        let mut encoded: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| (encode(key), encode(value)))
            .chain(
                self.oauth_params(nonce, timestamp)
                    .into_iter()
                    .map(|(key, value)| (encode(&key), encode(&value))),
            )
            .collect();
        encoded.sort();
        let joined = encoded
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(url),
            encode(&joined)
        )
    }

    /// Base64 HMAC-SHA1 of the base string.
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PublishError> {
        let key = format!(
            "{}&{}",
            encode(&self.credentials.api_secret),
            encode(&self.credentials.access_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|err| PublishError::Signing(format!("bad signing key: {err}")))?;
        mac.update(self.base_string(method, url, params, nonce, timestamp).as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// The `Authorization` header value for a request.
    ///
    /// `params` are the query and form parameters of the request, JSON bodies
    /// are not signed.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let nonce = nonce();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_with(method, url, params, &nonce, timestamp)
    }

    /// [Self::authorization] with a fixed nonce and timestamp.
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PublishError> {
        let signature = self.signature(method, url, params, nonce, timestamp)?;
        let mut fields = self.oauth_params(nonce, timestamp);
        fields.push(("oauth_signature".to_string(), signature));
        fields.sort();
        let header = fields
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {header}"))
    }
}
