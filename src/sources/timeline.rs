//! Posts fetched from the account's timeline through the REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::header;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::oauth::{authorization_header, RequestStamp};
use crate::config::{Config, TwitterCredentials};
use crate::constants::{HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::extract::BodyExtractor;
use crate::post::{local_offset, Post};

const USER_TIMELINE_PATH: &str = "/1.1/statuses/user_timeline.json";

/// `created_at` layout used by the timeline API, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// One entry of the user timeline response.
#[derive(Debug, Deserialize)]
struct TimelineEntry {
    id_str: String,
    created_at: String,
    #[serde(alias = "full_text")]
    text: String,
    #[serde(default)]
    entities: Entities,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    media_url_https: String,
}

/// Signed client for a single account's timeline.
pub struct TimelineClient {
    client: reqwest::Client,
    credentials: TwitterCredentials,
    endpoint: String,
    screen_name: String,
    count: u32,
}

impl TimelineClient {
    /// Create a client for the account configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials: config.twitter.clone(),
            endpoint: format!(
                "{}{USER_TIMELINE_PATH}",
                config.twitter_api_url.trim_end_matches('/')
            ),
            screen_name: config.screen_name.clone(),
            count: config.timeline_count,
        })
    }

    /// Fetch the most recent posts newer than `since_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a non-success
    /// status, the body cannot be decoded, or a body fails strict extraction.
    pub async fn fetch_since(
        &self,
        since_id: Option<&str>,
        extractor: &dyn BodyExtractor,
    ) -> Result<Vec<Post>> {
        let mut params = vec![
            ("screen_name".to_string(), self.screen_name.clone()),
            ("count".to_string(), self.count.to_string()),
        ];
        if let Some(since) = since_id.filter(|s| !s.is_empty()) {
            params.push(("since_id".to_string(), since.to_string()));
        }

        let url = Url::parse_with_params(&self.endpoint, &params)
            .with_context(|| format!("Invalid timeline URL: {}", self.endpoint))?;
        let authorization = authorization_header(
            &self.credentials,
            "GET",
            &self.endpoint,
            &params,
            &RequestStamp::generate(),
        );

        debug!(screen_name = %self.screen_name, since_id = ?since_id, "Fetching timeline");

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, authorization)
            .send()
            .await
            .context("Failed to fetch timeline")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Timeline fetch failed with status {status}: {body}");
        }

        let entries: Vec<TimelineEntry> = response
            .json()
            .await
            .context("Failed to decode timeline response")?;

        let posts = entries
            .into_iter()
            .map(|entry| entry_to_post(entry, extractor))
            .collect::<Result<Vec<_>>>()?;

        info!(count = posts.len(), "Fetched posts from timeline");
        Ok(posts)
    }
}

fn entry_to_post(entry: TimelineEntry, extractor: &dyn BodyExtractor) -> Result<Post> {
    let mut post = Post::new(entry.id_str, entry.text);
    let extracted = extractor
        .extract(&post.body)
        .with_context(|| format!("Failed to parse post {}", post.id))?;
    post.apply(extracted);

    post.timestamp = parse_created_at(&entry.created_at);
    if post.timestamp.is_none() {
        debug!(id = %post.id, created_at = %entry.created_at, "Unparseable timestamp");
    }

    post.image_urls = entry
        .entities
        .media
        .into_iter()
        .map(|m| m.media_url_https)
        .collect();

    Ok(post)
}

/// Parse a `created_at` value into the local time zone.
#[must_use]
pub fn parse_created_at(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .ok()
        .map(|ts| ts.with_timezone(&local_offset()))
}
