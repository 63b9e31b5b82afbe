//! Post and place records, and their JSON representation.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::constants::LOCAL_UTC_OFFSET_SECS;
use crate::extract::Extracted;

/// Location of the shop a post is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    /// A place known only by name, before enrichment.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether enrichment has filled in the details.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        !self.address.is_empty()
    }
}

/// One timeline entry with the fields parsed out of its body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Original, unmodified body text.
    #[serde(rename = "text")]
    pub body: String,
    #[serde(rename = "imageUrls")]
    pub image_urls: Vec<String>,
    #[serde(rename = "date")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub place: Option<Place>,
    pub menu: Option<String>,
    pub price: Option<u32>,
    #[serde(rename = "feel")]
    pub commentary: String,
}

impl Post {
    /// Create a post from its identifier and body, with nothing parsed yet.
    #[must_use]
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Copy the fields parsed out of the body onto this post.
    pub fn apply(&mut self, extracted: Extracted) {
        self.place = extracted.place_name.map(Place::named);
        self.price = extracted.price;
        self.menu = extracted.menu;
        self.commentary = extracted.commentary;
    }

    /// Name of the place to look up, if there is one worth looking up.
    #[must_use]
    pub fn place_query(&self) -> Option<&str> {
        self.place
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// The fixed civil time zone timestamps are normalized to.
#[must_use]
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS).expect("Invalid local UTC offset")
}

/// Convert epoch seconds to a local timestamp.
#[must_use]
pub fn from_epoch_secs(secs: i64) -> Option<DateTime<FixedOffset>> {
    local_offset().timestamp_opt(secs, 0).single()
}
