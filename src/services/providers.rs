use std::path::Path;

use async_trait::async_trait;

use crate::domain::matching::ProgressEvent;
use crate::domain::track::{Candidate, SourcePlaylist, SourceTrack};
use crate::services::error::Result;

#[async_trait]
pub trait SourcePlaylistProvider: Send + Sync {
    /// Fails with `Auth` or `NotFound`.
    async fn fetch(&self, playlist_reference: &str) -> Result<SourcePlaylist>;
}

#[async_trait]
pub trait DestinationSearch: Send + Sync {
    /// Candidates in the destination's own relevance order.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>>;
}

#[async_trait]
pub trait DestinationPlaylistCreator: Send + Sync {
    /// Returns the URL of the new playlist.
    async fn create(&self, title: &str, candidate_ids: &[String]) -> Result<String>;
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent) -> Result<()>;
}

#[async_trait]
pub trait UnmatchedLog: Send + Sync {
    async fn write(&self, tracks: &[SourceTrack], path: &Path) -> Result<()>;
}

/// Sink for callers that don't display progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) -> Result<()> {
        Ok(())
    }
}
