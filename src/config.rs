use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::services::error::{Result, TransferError};
use crate::services::transfer_service::{DEFAULT_LOG_PATH, TransferOptions};

const DEFAULT_SEARCH_LIMIT: u32 = 5;
// YouTube's maxResults bounds.
const SEARCH_LIMIT_RANGE: RangeInclusive<u32> = 1..=50;
const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 2000;

pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl SpotifyConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
        })
    }
}

pub struct YouTubeConfig {
    pub api_key: String,
    /// Only needed to create playlists.
    pub access_token: Option<String>,
}

impl YouTubeConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: required("YOUTUBE_API_KEY")?,
            access_token: optional("YOUTUBE_ACCESS_TOKEN"),
        })
    }
}

pub struct TransferConfig {
    pub search_limit: u32,
    pub search_delay: Duration,
    pub rate_limit_backoff: Duration,
    pub log_path: PathBuf,
}

impl TransferConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            search_limit: search_limit(parsed("SEARCH_LIMIT")?.unwrap_or(DEFAULT_SEARCH_LIMIT))?,
            search_delay: Duration::from_millis(parsed("SEARCH_DELAY_MS")?.unwrap_or(0)),
            rate_limit_backoff: Duration::from_millis(
                parsed("RATE_LIMIT_BACKOFF_MS")?.unwrap_or(DEFAULT_RATE_LIMIT_BACKOFF_MS),
            ),
            log_path: optional("UNMATCHED_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
        })
    }

    pub fn options(&self, skip_logging: bool) -> TransferOptions {
        TransferOptions {
            skip_logging,
            log_path: self.log_path.clone(),
            search_delay: self.search_delay,
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| TransferError::Config(format!("Missing {name}")))
}

fn parsed<T: FromStr>(name: &str) -> Result<Option<T>> {
    parse_value(name, optional(name).as_deref())
}

fn parse_value<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|raw| {
        raw.trim()
            .parse()
            .map_err(|_| TransferError::Config(format!("Invalid value for {name}: {raw}")))
    })
    .transpose()
}

fn search_limit(limit: u32) -> Result<u32> {
    if SEARCH_LIMIT_RANGE.contains(&limit) {
        Ok(limit)
    } else {
        Err(TransferError::Config(format!(
            "SEARCH_LIMIT must be between {} and {}, got {limit}",
            SEARCH_LIMIT_RANGE.start(),
            SEARCH_LIMIT_RANGE.end()
        )))
    }
}
