//! Place enrichment via a places text-search service.
//!
//! Every post naming a shop gets one lookup. Lookups run concurrently under a
//! fixed limit, each with its own timeout, and the caller waits for all of
//! them. A failed lookup only leaves that post's place details empty.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::{HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::post::Post;

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";

/// Details of the best match for a place query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// Something that can resolve a free-text place name.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Look up `query`, returning the first match if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup service fails.
    async fn text_search(&self, query: &str) -> Result<Option<PlaceDetails>>;
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Client for the places text-search endpoint.
pub struct PlacesClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl PlacesClient {
    /// Create a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or the HTTP client cannot
    /// be built.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .place_api_key
            .clone()
            .context("PLACE_API_KEY is required for place lookups")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{TEXT_SEARCH_PATH}",
                config.places_api_url.trim_end_matches('/')
            ),
            api_key,
            language: config.place_language.clone(),
        })
    }
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    async fn text_search(&self, query: &str) -> Result<Option<PlaceDetails>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("language", self.language.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send place search")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Place search failed with status {status}");
        }

        let body: TextSearchResponse = response
            .json()
            .await
            .context("Failed to decode place search response")?;

        match body.status.as_str() {
            "OK" => Ok(body.results.into_iter().next().map(|r| PlaceDetails {
                address: r.formatted_address,
                lat: r.geometry.location.lat,
                lng: r.geometry.location.lng,
            })),
            "ZERO_RESULTS" => Ok(None),
            other => anyhow::bail!(
                "Place search returned {other}: {}",
                body.error_message.unwrap_or_default()
            ),
        }
    }
}

/// Outcome counts of an enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Lookups issued, one per post with a place name.
    pub requested: usize,
    /// Posts whose place details were filled in.
    pub enriched: usize,
    /// Lookups that errored, timed out or panicked.
    pub failed: usize,
}

/// Fill in place details for every post that names a place.
///
/// Returns once every lookup has finished.
pub async fn enrich_places(
    lookup: Arc<dyn PlaceLookup>,
    posts: &mut [Post],
    concurrency: usize,
    timeout: Duration,
) -> EnrichStats {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, post) in posts.iter().enumerate() {
        let Some(query) = post.place_query() else {
            continue;
        };
        let query = query.to_string();
        let lookup = Arc::clone(&lookup);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire().await;
            let outcome = tokio::time::timeout(timeout, lookup.text_search(&query)).await;
            (index, query, outcome)
        });
    }

    let mut stats = EnrichStats {
        requested: tasks.len(),
        ..EnrichStats::default()
    };
    debug!(lookups = stats.requested, concurrency, "Looking up places");

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, _, Ok(Ok(Some(details))))) => {
                if let Some(place) = posts[index].place.as_mut() {
                    place.address = details.address;
                    place.lat = details.lat;
                    place.lng = details.lng;
                    stats.enriched += 1;
                }
            }
            Ok((_, query, Ok(Ok(None)))) => {
                debug!(query = %query, "No place found");
            }
            Ok((_, query, Ok(Err(e)))) => {
                warn!(query = %query, "Place lookup failed: {e:#}");
                stats.failed += 1;
            }
            Ok((_, query, Err(_))) => {
                warn!(query = %query, timeout_secs = timeout.as_secs(), "Place lookup timed out");
                stats.failed += 1;
            }
            Err(e) => {
                error!("Place lookup task failed: {e}");
                stats.failed += 1;
            }
        }
    }

    info!(
        requested = stats.requested,
        enriched = stats.enriched,
        failed = stats.failed,
        "Place enrichment finished"
    );
    stats
}
