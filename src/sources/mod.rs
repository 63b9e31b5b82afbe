//! Where posts come from: a saved timeline snapshot and the live timeline API.

pub mod oauth;
mod snapshot;
mod timeline;

pub use snapshot::{load_snapshot, parse_snapshot};
pub use timeline::{parse_created_at, TimelineClient};

use crate::post::Post;

/// The `since_id` bound for the API fetch: the first snapshot post's id.
#[must_use]
pub fn since_watermark(snapshot: &[Post]) -> Option<&str> {
    snapshot.first().map(|p| p.id.as_str())
}
