use crate::config::SpotifyConfig;
use crate::infrastructure::spotify::{SpotifyClient, parse_playlist_id};
use crate::services::error::Result;

const PREVIEW_COUNT: usize = 10;

/// Check Spotify credentials by fetching a playlist and listing its first tracks.
pub async fn test_source(reference: &str) -> Result<()> {
    let config = SpotifyConfig::from_env()?;
    let id = parse_playlist_id(reference)?;
    let spotify = SpotifyClient::new(&config.client_id, &config.client_secret).await?;

    println!("Fetching playlist: {reference}");
    let summary = spotify.describe(&id).await?;
    println!("\nPlaylist: {}", summary.name);
    println!("Owner: {}", summary.owner.as_deref().unwrap_or("unknown"));
    println!("Total tracks: {}", summary.total_tracks);

    let tracks = spotify.get_playlist_tracks(&id).await?;
    println!("Available tracks: {}\n", tracks.len());

    println!("First {PREVIEW_COUNT} tracks:");
    println!("{}", "-".repeat(60));
    for (i, track) in tracks.iter().take(PREVIEW_COUNT).enumerate() {
        println!("{:2}. {track}", i + 1);
    }
    if tracks.len() > PREVIEW_COUNT {
        println!("... and {} more tracks", tracks.len() - PREVIEW_COUNT);
    }
    Ok(())
}
