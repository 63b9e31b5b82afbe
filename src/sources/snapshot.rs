//! Posts scraped from a saved HTML snapshot of the account's timeline.

use std::path::Path;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::extract::BodyExtractor;
use crate::post::{from_epoch_secs, Post};

/// Classes marking timeline elements that are not the account's own posts.
const SKIPPED_CLASSES: &[&str] = &["separated-module", "has-profile-promoted-tweet"];

/// Read and parse the snapshot at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if a body fails strict
/// extraction.
pub async fn load_snapshot(path: &Path, extractor: &dyn BodyExtractor) -> Result<Vec<Post>> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

    let posts = parse_snapshot(&html, extractor)?;
    info!(path = %path.display(), count = posts.len(), "Loaded posts from snapshot");
    Ok(posts)
}

/// Parse posts out of snapshot HTML, in document order.
///
/// # Errors
///
/// Returns an error if a body fails strict extraction.
pub fn parse_snapshot(html: &str, extractor: &dyn BodyExtractor) -> Result<Vec<Post>> {
    let document = Html::parse_document(html);
    let post_selector = selector(".js-stream-tweet")?;
    let text_selector = selector(".tweet-text")?;
    let timestamp_selector = selector(".js-short-timestamp")?;
    let photo_selector = selector(".js-adaptive-photo")?;

    let mut posts = Vec::new();

    for element in document.select(&post_selector) {
        if is_skipped(&element) {
            continue;
        }

        let Some(id) = element
            .value()
            .attr("data-tweet-id")
            .filter(|id| !id.is_empty())
        else {
            debug!("Dropping snapshot post without an id");
            continue;
        };

        let body: String = element
            .select(&text_selector)
            .flat_map(|e| e.text())
            .collect();

        let mut post = Post::new(id, body);
        let extracted = extractor
            .extract(&post.body)
            .with_context(|| format!("Failed to parse post {id}"))?;
        post.apply(extracted);

        post.timestamp = element
            .select(&timestamp_selector)
            .next()
            .and_then(|e| e.value().attr("data-time"))
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(from_epoch_secs);

        for photo in element.select(&photo_selector) {
            if let Some(url) = photo.value().attr("data-image-url") {
                post.image_urls.push(url.to_string());
            } else {
                debug!(id = %id, "Photo element without an image url");
            }
        }

        posts.push(post);
    }

    Ok(posts)
}

fn is_skipped(element: &ElementRef) -> bool {
    element
        .value()
        .classes()
        .any(|class| SKIPPED_CLASSES.contains(&class))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Failed to create selector {css}: {e:?}"))
}
