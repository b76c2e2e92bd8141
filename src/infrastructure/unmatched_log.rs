use std::path::Path;

use async_trait::async_trait;

use crate::domain::track::SourceTrack;
use crate::services::error::Result;
use crate::services::providers::UnmatchedLog;

/// Writes unmatched tracks as `artist - title` lines, replacing any
/// previous file.
pub struct FileUnmatchedLog;

#[async_trait]
impl UnmatchedLog for FileUnmatchedLog {
    async fn write(&self, tracks: &[SourceTrack], path: &Path) -> Result<()> {
        tokio::fs::write(path, render(tracks)).await?;
        Ok(())
    }
}

fn render(tracks: &[SourceTrack]) -> String {
    tracks
        .iter()
        .map(|t| format!("{} - {}\n", t.artist, t.title))
        .collect()
}
