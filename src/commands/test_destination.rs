use crate::commands::output::duration_or_placeholder;
use crate::config::{TransferConfig, YouTubeConfig};
use crate::domain::matching::{MatchResult, UnmatchedReason};
use crate::domain::track::SourceTrack;
use crate::infrastructure::youtube::YouTubeClient;
use crate::services::error::Result;
use crate::services::query::build_query;
use crate::services::scorer::{MAX_SCORE, select_best};

/// Run one search against YouTube and show which result the matcher picks.
pub async fn test_destination(artist: &str, title: &str) -> Result<()> {
    let config = YouTubeConfig::from_env()?;
    let transfer = TransferConfig::from_env()?;
    let youtube = YouTubeClient::new(
        reqwest::Client::new(),
        config.api_key,
        config.access_token,
        transfer.search_limit,
    );

    let track = SourceTrack::new(artist, title);
    println!("Searching for: {track}");
    let candidates = youtube.search_tracks(&build_query(&track)).await?;

    match select_best(&track, &candidates) {
        MatchResult::Matched {
            candidate, score, ..
        } => {
            println!("\nFound: {}", candidate.title);
            println!("Artist: {}", candidate.artist);
            println!("Album: {}", candidate.album.as_deref().unwrap_or("-"));
            println!("Video ID: {}", candidate.id);
            println!("Duration: {}", duration_or_placeholder(candidate.duration_seconds));
            println!("Score: {score:.2} / {MAX_SCORE:.2}");
        }
        MatchResult::Unmatched {
            reason: UnmatchedReason::NoCandidates,
            ..
        } => println!("\nNo results found"),
        MatchResult::Unmatched { .. } => {
            println!("\nNo close match among {} results:", candidates.len());
            for candidate in &candidates {
                println!("  - {candidate}");
            }
        }
    }
    Ok(())
}
