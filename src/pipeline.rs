//! One collection run: snapshot, timeline, optional enrichment, output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::extract::ConventionExtractor;
use crate::places::{enrich_places, EnrichStats, PlacesClient};
use crate::sources::{load_snapshot, since_watermark, TimelineClient};
use crate::store::save_posts;

/// What a run collected and where it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub snapshot_posts: usize,
    pub timeline_posts: usize,
    /// Present only when place enrichment ran.
    pub places: Option<EnrichStats>,
    pub output_path: PathBuf,
}

impl RunSummary {
    #[must_use]
    pub fn total_posts(&self) -> usize {
        self.snapshot_posts + self.timeline_posts
    }
}

/// Collect posts from both sources, optionally enrich them, and save them.
///
/// Snapshot posts come first; the first snapshot post's id bounds the timeline
/// fetch so posts already in the snapshot are not fetched again.
///
/// # Errors
///
/// Returns an error on any fatal condition: unreadable snapshot, timeline
/// failure, strict extraction failure, missing places key, or write failure.
pub async fn run(config: &Config, with_places: bool) -> Result<RunSummary> {
    let extractor = if config.strict_price {
        ConventionExtractor::strict()
    } else {
        ConventionExtractor::lenient()
    };

    let mut posts = load_snapshot(&config.snapshot_path, &extractor)
        .await
        .context("Failed to load posts from snapshot")?;
    let snapshot_posts = posts.len();

    let since = since_watermark(&posts).map(ToString::to_string);
    info!(since_id = ?since, "Fetching newer posts from timeline");

    let timeline = TimelineClient::new(config)?;
    let fetched = timeline
        .fetch_since(since.as_deref(), &extractor)
        .await
        .context("Failed to fetch posts from timeline")?;
    let timeline_posts = fetched.len();
    posts.extend(fetched);

    let places = if with_places {
        let client = PlacesClient::new(config)?;
        Some(
            enrich_places(
                Arc::new(client),
                &mut posts,
                config.place_concurrency,
                config.place_timeout,
            )
            .await,
        )
    } else {
        None
    };

    save_posts(&config.output_path, &posts).await?;

    Ok(RunSummary {
        snapshot_posts,
        timeline_posts,
        places,
        output_path: config.output_path.clone(),
    })
}
