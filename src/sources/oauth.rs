//! OAuth 1.0a request signing (HMAC-SHA1) for the timeline API.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::TwitterCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Per-request values that must be unique (nonce) or current (timestamp).
#[derive(Debug, Clone)]
pub struct RequestStamp {
    pub nonce: String,
    pub timestamp: u64,
}

impl RequestStamp {
    /// A random 32-character nonce and the current epoch time.
    #[must_use]
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self { nonce, timestamp }
    }
}

/// Build the `Authorization` header value for a request.
///
/// `url` must not carry a query string; its parameters go in `params`.
#[must_use]
pub fn authorization_header(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
    stamp: &RequestStamp,
) -> String {
    let timestamp = stamp.timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", stamp.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(credentials, method, url, params, &oauth_params);
    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort_unstable();

    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    format!("OAuth {}", fields.join(", "))
}

fn sign(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
    oauth_params: &[(&str, &str)],
) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&normalized)
    );
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
