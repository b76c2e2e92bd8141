use async_trait::async_trait;
use futures::stream::TryStreamExt;
use regex::Regex;
use rspotify::model::{FullTrack, PlayableItem, PlaylistId};
use rspotify::{ClientCredsSpotify, Credentials, prelude::*};
use std::sync::LazyLock;

use crate::domain::track::{SourcePlaylist, SourceTrack};
use crate::services::error::{Result, TransferError};
use crate::services::providers::SourcePlaylistProvider;

static PLAYLIST_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"playlist[/:]([a-zA-Z0-9]+)").unwrap());

static PLAYLIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// Accepts an open.spotify.com URL, a `spotify:playlist:` URI or a bare ID.
pub fn parse_playlist_id(reference: &str) -> Result<String> {
    let reference = reference.trim();
    if let Some(caps) = PLAYLIST_REF_RE.captures(reference) {
        return Ok(caps[1].to_string());
    }
    if PLAYLIST_ID_RE.is_match(reference) {
        return Ok(reference.to_string());
    }
    Err(TransferError::InvalidReference(reference.to_string()))
}

pub struct PlaylistSummary {
    pub name: String,
    pub owner: Option<String>,
    pub total_tracks: u32,
}

pub struct SpotifyClient {
    client: ClientCredsSpotify,
}

impl SpotifyClient {
    pub async fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        let creds = Credentials::new(client_id, client_secret);
        let client = ClientCredsSpotify::new(creds);
        client
            .request_token()
            .await
            .map_err(|e| TransferError::Auth(format!("Spotify token request failed: {e}")))?;
        Ok(Self { client })
    }

    pub async fn describe(&self, reference: &str) -> Result<PlaylistSummary> {
        let id = parse_playlist_id(reference)?;
        let playlist_id = to_playlist_id(&id)?;
        let playlist = self
            .client
            .playlist(playlist_id, None, None)
            .await
            .map_err(|e| TransferError::NotFound(format!("{id}: {e}")))?;

        Ok(PlaylistSummary {
            name: playlist.name,
            owner: playlist.owner.display_name,
            total_tracks: playlist.tracks.total,
        })
    }

    pub async fn get_playlist_tracks(&self, id: &str) -> Result<Vec<SourceTrack>> {
        let playlist_id = to_playlist_id(id)?;

        let stream = self.client.playlist_items(playlist_id, None, None);
        futures::pin_mut!(stream);

        let mut tracks = Vec::new();
        while let Some(item) = stream
            .try_next()
            .await
            .map_err(|e| TransferError::Transport(format!("Spotify playlist page: {e}")))?
        {
            // Null tracks are items no longer available; episodes aren't music.
            match item.track {
                Some(PlayableItem::Track(full_track)) => tracks.push(source_track(full_track)),
                _ => tracing::debug!("Skipping unavailable playlist item"),
            }
        }
        Ok(tracks)
    }
}

#[async_trait]
impl SourcePlaylistProvider for SpotifyClient {
    async fn fetch(&self, playlist_reference: &str) -> Result<SourcePlaylist> {
        let id = parse_playlist_id(playlist_reference)?;
        let summary = self.describe(&id).await?;
        let tracks = self.get_playlist_tracks(&id).await?;
        Ok(SourcePlaylist {
            name: summary.name,
            tracks,
        })
    }
}

fn to_playlist_id(id: &str) -> Result<PlaylistId<'_>> {
    PlaylistId::from_id(id).map_err(|_| TransferError::InvalidReference(id.to_string()))
}

fn source_track(track: FullTrack) -> SourceTrack {
    let artist = track
        .artists
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    let duration_ms = track.duration.num_milliseconds().max(0);

    let mut source = SourceTrack::new(artist, track.name);
    if !track.album.name.is_empty() {
        source = source.with_album(track.album.name);
    }
    if let Ok(seconds) = u32::try_from(duration_ms / 1000) {
        source = source.with_duration(seconds);
    }
    source
}
