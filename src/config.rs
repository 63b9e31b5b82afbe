use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// OAuth 1.0a credentials for the timeline API.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Input / output
    pub snapshot_path: PathBuf,
    pub output_path: PathBuf,

    // Timeline API
    pub twitter: TwitterCredentials,
    pub twitter_api_url: String,
    pub screen_name: String,
    pub timeline_count: u32,

    // Places lookup
    pub place_api_key: Option<String>,
    pub places_api_url: String,
    pub place_language: String,
    pub place_concurrency: usize,
    pub place_timeout: Duration,

    // Extraction policy
    pub strict_price: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Input / output
            snapshot_path: PathBuf::from(env_or_default("SNAPSHOT_PATH", "twitter.html")),
            output_path: PathBuf::from(env_or_default("OUTPUT_PATH", "data/habomai.json")),

            // Timeline API
            twitter: TwitterCredentials {
                consumer_key: required_env("CONSUMER_KEY")?,
                consumer_secret: required_env("CONSUMER_SECRET")?,
                access_token: required_env("ACCESS_TOKEN")?,
                access_token_secret: required_env("ACCESS_TOKEN_SECRET")?,
            },
            twitter_api_url: env_or_default("TWITTER_API_URL", "https://api.twitter.com"),
            screen_name: env_or_default("SCREEN_NAME", "habomaijiro"),
            timeline_count: parse_env_u32("TIMELINE_COUNT", 200)?,

            // Places lookup
            place_api_key: optional_env("PLACE_API_KEY"),
            places_api_url: env_or_default("PLACES_API_URL", "https://maps.googleapis.com"),
            place_language: env_or_default("PLACE_LANGUAGE", "ja"),
            place_concurrency: parse_env_usize("PLACE_CONCURRENCY", 8)?,
            place_timeout: Duration::from_secs(parse_env_u64("PLACE_TIMEOUT_SECS", 10)?),

            // Extraction policy
            strict_price: parse_env_bool("STRICT_PRICE", false)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// `with_places` additionally requires a places API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self, with_places: bool) -> Result<(), ConfigError> {
        for (name, value) in [
            ("CONSUMER_KEY", &self.twitter.consumer_key),
            ("CONSUMER_SECRET", &self.twitter.consumer_secret),
            ("ACCESS_TOKEN", &self.twitter.access_token),
            ("ACCESS_TOKEN_SECRET", &self.twitter.access_token_secret),
            ("SCREEN_NAME", &self.screen_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: "cannot be empty".to_string(),
                });
            }
        }
        if !(1..=200).contains(&self.timeline_count) {
            return Err(ConfigError::InvalidValue {
                name: "TIMELINE_COUNT".to_string(),
                message: format!("must be between 1 and 200, got {}", self.timeline_count),
            });
        }
        if self.place_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "PLACE_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if with_places && self.place_api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("PLACE_API_KEY".to_string()));
        }
        Ok(())
    }

    /// Configuration with dummy credentials and local paths, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            snapshot_path: PathBuf::from("twitter.html"),
            output_path: PathBuf::from("data/habomai.json"),
            twitter: TwitterCredentials {
                consumer_key: "test-consumer-key".to_string(),
                consumer_secret: "test-consumer-secret".to_string(),
                access_token: "test-access-token".to_string(),
                access_token_secret: "test-access-token-secret".to_string(),
            },
            twitter_api_url: "http://127.0.0.1:9".to_string(),
            screen_name: "habomaijiro".to_string(),
            timeline_count: 200,
            place_api_key: Some("test-place-key".to_string()),
            places_api_url: "http://127.0.0.1:9".to_string(),
            place_language: "ja".to_string(),
            place_concurrency: 4,
            place_timeout: Duration::from_secs(5),
            strict_price: false,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}
