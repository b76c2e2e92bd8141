use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::track::Candidate;
use crate::services::error::{Result, TransferError};
use crate::services::providers::{DestinationPlaylistCreator, DestinationSearch};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const MUSIC_CATEGORY_ID: &str = "10";
const PLAYLIST_DESCRIPTION: &str = "Imported from Spotify";

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
}

#[derive(Deserialize)]
struct VideosResponse {
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: ContentDetails,
}

#[derive(Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    reason: String,
}

pub struct YouTubeClient {
    http: Client,
    api_key: String,
    access_token: Option<String>,
    limit: u32,
}

impl YouTubeClient {
    pub fn new(http: Client, api_key: String, access_token: Option<String>, limit: u32) -> Self {
        Self {
            http,
            api_key,
            access_token,
            limit,
        }
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Candidate>> {
        let limit = self.limit.to_string();
        let request = self.http.get(format!("{API_BASE}/search")).query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("videoCategoryId", MUSIC_CATEGORY_ID),
            ("q", query),
            ("maxResults", limit.as_str()),
            ("key", self.api_key.as_str()),
        ]);
        let search: SearchResponse = send_json(request, false).await?;
        let mut candidates = candidates_from_search(search);

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        match self.fetch_durations(&ids).await {
            Ok(durations) => {
                for candidate in &mut candidates {
                    candidate.duration_seconds = durations.get(&candidate.id).copied();
                }
            }
            Err(e) => tracing::warn!("YouTube duration lookup failed: {e}"),
        }

        Ok(candidates)
    }

    async fn fetch_durations(&self, ids: &[String]) -> Result<HashMap<String, u32>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let joined = ids.join(",");
        let request = self.http.get(format!("{API_BASE}/videos")).query(&[
            ("part", "contentDetails"),
            ("id", joined.as_str()),
            ("key", self.api_key.as_str()),
        ]);
        let videos: VideosResponse = send_json(request, false).await?;

        Ok(videos
            .items
            .into_iter()
            .filter_map(|v| Some((v.id, parse_iso_duration(&v.content_details.duration)?)))
            .collect())
    }

    fn token(&self) -> Result<&str> {
        self.access_token.as_deref().ok_or_else(|| {
            TransferError::Auth(
                "YOUTUBE_ACCESS_TOKEN is not set; an OAuth token is required to create playlists"
                    .to_string(),
            )
        })
    }

    async fn create_playlist(&self, title: &str) -> Result<String> {
        let request = self
            .http
            .post(format!("{API_BASE}/playlists"))
            .query(&[("part", "snippet,status")])
            .bearer_auth(self.token()?)
            .json(&json!({
                "snippet": { "title": title, "description": PLAYLIST_DESCRIPTION },
                "status": { "privacyStatus": "private" },
            }));
        let created: CreatedPlaylist = send_json(request, true).await?;
        Ok(created.id)
    }

    async fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        let request = self
            .http
            .post(format!("{API_BASE}/playlistItems"))
            .query(&[("part", "snippet")])
            .bearer_auth(self.token()?)
            .json(&json!({
                "snippet": {
                    "playlistId": playlist_id,
                    "resourceId": { "kind": "youtube#video", "videoId": video_id },
                },
            }));
        let _: serde_json::Value = send_json(request, true).await?;
        Ok(())
    }
}

#[async_trait]
impl DestinationSearch for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        self.search_tracks(query).await
    }
}

#[async_trait]
impl DestinationPlaylistCreator for YouTubeClient {
    async fn create(&self, title: &str, candidate_ids: &[String]) -> Result<String> {
        self.token()?;
        let playlist_id = self.create_playlist(title).await?;
        let ids = unique_in_order(candidate_ids);
        tracing::info!("Adding {} videos to playlist {playlist_id}", ids.len());

        for video_id in ids {
            self.add_to_playlist(&playlist_id, video_id).await?;
        }
        Ok(format!("https://music.youtube.com/playlist?list={playlist_id}"))
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, authed: bool) -> Result<T> {
    let resp = request
        .send()
        .await
        .map_err(|e| TransferError::Transport(format!("YouTube request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(status_error(status, &body, authed));
    }

    resp.json()
        .await
        .map_err(|e| TransferError::Transport(format!("YouTube parse failed: {e}")))
}

fn status_error(status: StatusCode, body: &str, authed: bool) -> TransferError {
    let (message, reasons): (String, Vec<String>) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (
            env.error.message,
            env.error.errors.into_iter().map(|e| e.reason).collect(),
        ),
        Err(_) => (body.trim().to_string(), Vec::new()),
    };
    let detail = format!("HTTP {status}: {message}");

    let throttled = reasons.iter().any(|r| {
        matches!(
            r.as_str(),
            "quotaExceeded" | "rateLimitExceeded" | "userRateLimitExceeded"
        )
    });

    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && throttled) {
        TransferError::RateLimit(detail)
    } else if status == StatusCode::UNAUTHORIZED || (authed && status == StatusCode::FORBIDDEN) {
        TransferError::Auth(detail)
    } else {
        TransferError::Transport(detail)
    }
}

fn candidates_from_search(search: SearchResponse) -> Vec<Candidate> {
    search
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let channel = decode_entities(&item.snippet.channel_title);
            let artist = channel
                .strip_suffix(" - Topic")
                .map(str::to_string)
                .unwrap_or(channel);

            Some(Candidate {
                id: video_id,
                artist,
                title: decode_entities(&item.snippet.title),
                album: None,
                duration_seconds: None,
            })
        })
        .collect()
}

/// `PT4M13S` -> 253. Zero-length (live streams) counts as unknown.
fn parse_iso_duration(raw: &str) -> Option<u32> {
    let caps = ISO_DURATION_RE.captures(raw)?;
    let part = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let total = [(1, 86_400u64), (2, 3600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0u64, |acc, (i, unit)| acc.checked_add(part(i)?.checked_mul(unit)?))?;
    u32::try_from(total).ok().filter(|&secs| secs > 0)
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn unique_in_order(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
