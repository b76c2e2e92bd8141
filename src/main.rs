mod commands;
mod config;
mod domain;
mod infrastructure;
mod services;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "renoir-transfer")]
#[command(about = "Transfer Spotify playlists to YouTube Music")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Test Spotify connection by fetching a playlist
    Test {
        /// Spotify playlist URL, URI or ID
        url: String,
    },
    /// Test YouTube connection by searching for a song
    #[command(name = "test-yt")]
    TestYt {
        /// Artist name
        artist: String,
        /// Song title
        title: String,
    },
    /// Transfer a Spotify playlist to YouTube Music
    Create {
        /// Spotify playlist URL, URI or ID
        url: String,
        /// Only search for matches, don't create playlist
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Don't log not-found tracks to file
        #[arg(long)]
        no_log: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Test { url } => commands::test_source::test_source(&url).await,
        Command::TestYt { artist, title } => {
            commands::test_destination::test_destination(&artist, &title).await
        }
        Command::Create {
            url,
            dry_run,
            no_log,
        } => commands::create::create(&url, dry_run, no_log).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
