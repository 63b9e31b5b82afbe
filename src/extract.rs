//! Structured fields parsed out of free-text post bodies.
//!
//! Posts follow an informal convention of `、`-separated segments:
//!
//! ```text
//! commentary、shop name、menu + price (e.g. "ラーメン小800YEN")、more commentary...
//! ```
//!
//! The parser is best effort. It never looks past that convention, and callers
//! holding structured data can skip it entirely by providing their own
//! [`BodyExtractor`].

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::constants::SEGMENT_DELIMITER;

/// Leftmost `<digits>YEN` marker. The digit run may be empty.
static PRICE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]*)YEN").expect("Invalid price regex"));

/// Everything up to and including the last `YEN` on a line.
static MENU_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*YEN").expect("Invalid menu regex"));

/// Substrings that never belong in the commentary: price prefixes, links and
/// attached-media short links.
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*YEN|https?://[0-9A-Za-z_/:%#$&?()~.=+\-]+|pic\.twitter\.com.*")
        .expect("Invalid noise regex")
});

/// Why the price segment of a body could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no price marker in segment {segment:?}")]
    MissingPrice { segment: String },
    #[error("invalid price {digits:?} in segment {segment:?}")]
    InvalidPrice { digits: String, segment: String },
}

/// Fields parsed out of a post body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub place_name: Option<String>,
    pub price: Option<u32>,
    pub menu: Option<String>,
    pub commentary: String,
}

/// Turns a raw post body into structured fields.
pub trait BodyExtractor: Send + Sync {
    /// Parse `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed and the extractor treats that
    /// as fatal.
    fn extract(&self, body: &str) -> Result<Extracted, ExtractError>;
}

/// Extractor for the `、`-separated posting convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionExtractor {
    strict: bool,
}

impl ConventionExtractor {
    /// Price failures are logged and the post is kept without a price.
    #[must_use]
    pub const fn lenient() -> Self {
        Self { strict: false }
    }

    /// Price failures are returned as errors.
    #[must_use]
    pub const fn strict() -> Self {
        Self { strict: true }
    }
}

impl BodyExtractor for ConventionExtractor {
    fn extract(&self, body: &str) -> Result<Extracted, ExtractError> {
        if self.strict {
            try_extract(body)
        } else {
            Ok(extract(body))
        }
    }
}

/// Parse a body, failing if its price segment is present but unparseable.
///
/// # Errors
///
/// Returns an error if the body has a third segment without a valid
/// `<digits>YEN` marker.
pub fn try_extract(body: &str) -> Result<Extracted, ExtractError> {
    match parse(body) {
        (extracted, None) => Ok(extracted),
        (_, Some(e)) => Err(e),
    }
}

/// Parse a body, logging and skipping an unparseable price segment.
#[must_use]
pub fn extract(body: &str) -> Extracted {
    let (extracted, error) = parse(body);
    if let Some(e) = error {
        warn!(error = %e, "Skipping price and menu for post");
    }
    extracted
}

fn parse(body: &str) -> (Extracted, Option<ExtractError>) {
    let segments: Vec<&str> = body.split(SEGMENT_DELIMITER).collect();
    let mut extracted = Extracted {
        place_name: segments.get(1).map(|s| (*s).to_string()),
        ..Extracted::default()
    };

    let mut error = None;
    if let Some(segment) = segments.get(2) {
        match parse_price(segment) {
            Ok((price, menu)) => {
                extracted.price = Some(price);
                extracted.menu = menu;
            }
            Err(e) => error = Some(e),
        }
    }

    extracted.commentary = if segments.len() < 2 {
        strip_noise(body)
    } else {
        let price_taken = extracted.price.is_some();
        segments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1 && !(*i == 2 && price_taken))
            .map(|(_, s)| strip_noise(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    (extracted, error)
}

/// Price and menu from the third segment.
fn parse_price(segment: &str) -> Result<(u32, Option<String>), ExtractError> {
    let caps = PRICE_MARKER
        .captures(segment)
        .ok_or_else(|| ExtractError::MissingPrice {
            segment: segment.to_string(),
        })?;
    let digits = caps.get(1).map_or("", |m| m.as_str());
    let price = digits.parse().map_err(|_| ExtractError::InvalidPrice {
        digits: digits.to_string(),
        segment: segment.to_string(),
    })?;

    let menu = MENU_PREFIX
        .find(segment)
        .map(|m| PRICE_MARKER.replace_all(m.as_str(), "").trim().to_string())
        .filter(|m| !m.is_empty());

    Ok((price, menu))
}

fn strip_noise(text: &str) -> String {
    NOISE.replace_all(text, "").trim().to_string()
}
