use std::sync::Arc;

use crate::commands::output::{ConsoleProgress, summary};
use crate::config::{SpotifyConfig, TransferConfig, YouTubeConfig};
use crate::domain::matching::{MatchResult, TransferMode};
use crate::infrastructure::spotify::{SpotifyClient, parse_playlist_id};
use crate::infrastructure::unmatched_log::FileUnmatchedLog;
use crate::infrastructure::youtube::YouTubeClient;
use crate::services::error::Result;
use crate::services::transfer_service::TransferService;

/// Transfer a Spotify playlist to YouTube Music.
pub async fn create(reference: &str, dry_run: bool, no_log: bool) -> Result<()> {
    // Reject bad references before any network call.
    parse_playlist_id(reference)?;

    let spotify_config = SpotifyConfig::from_env()?;
    let youtube_config = YouTubeConfig::from_env()?;
    let transfer_config = TransferConfig::from_env()?;

    let spotify =
        SpotifyClient::new(&spotify_config.client_id, &spotify_config.client_secret).await?;
    let youtube = Arc::new(YouTubeClient::new(
        reqwest::Client::new(),
        youtube_config.api_key,
        youtube_config.access_token,
        transfer_config.search_limit,
    ));

    let service = TransferService::new(Arc::new(spotify), youtube.clone(), youtube)
        .with_progress(Arc::new(ConsoleProgress))
        .with_unmatched_log(Arc::new(FileUnmatchedLog))
        .with_rate_limit_backoff(transfer_config.rate_limit_backoff);

    let mode = if dry_run {
        TransferMode::DryRun
    } else {
        TransferMode::Create
    };

    println!("Transferring playlist: {reference}");
    if dry_run {
        println!("[DRY RUN MODE - No playlist will be created]\n");
    }
    println!();

    let outcome = service
        .transfer(reference, mode, &transfer_config.options(no_log))
        .await?;

    for (i, result) in outcome.results.iter().enumerate() {
        match result {
            MatchResult::Matched {
                candidate, score, ..
            } => tracing::debug!("{:>3}. {} -> {candidate} ({score:.2})", i + 1, result.source()),
            MatchResult::Unmatched { source, reason } => {
                tracing::debug!("{:>3}. {source} unmatched: {reason}", i + 1)
            }
        }
    }
    print!("{}", summary(&outcome));
    Ok(())
}
