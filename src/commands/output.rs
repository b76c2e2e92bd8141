use std::io::{self, Write};

use crate::domain::matching::{ProgressEvent, TransferMode};
use crate::domain::track::format_duration;
use crate::services::error::Result;
use crate::services::providers::ProgressSink;
use crate::services::transfer_service::TransferOutcome;

const LABEL_WIDTH: usize = 50;
const MAX_UNMATCHED_SHOWN: usize = 10;
const RULE: &str = "============================================================";

/// Rewrites a single stdout line per track.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: &ProgressEvent) -> Result<()> {
        let mut out = io::stdout().lock();
        write!(out, "\r{}", progress_line(event))?;
        if event.index == event.total {
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}

pub fn progress_line(event: &ProgressEvent) -> String {
    let label: String = event.display_label.chars().take(LABEL_WIDTH).collect();
    format!(
        "[{}/{}] ({:.0}%) {:<width$}",
        event.index,
        event.total,
        event.percent,
        label,
        width = LABEL_WIDTH
    )
}

pub fn summary(outcome: &TransferOutcome) -> String {
    let report = &outcome.report;
    let mut out = String::new();

    out.push_str(&format!("\n{RULE}\nPlaylist: {}\n{RULE}\n", outcome.playlist_name));
    out.push_str(&format!("Total tracks:    {}\n", report.total));
    out.push_str(&format!("Matched:         {}\n", report.matched));
    out.push_str(&format!("Not found:       {}\n", report.unmatched));
    out.push_str(&format!("Match rate:      {:.1}%\n", report.match_rate * 100.0));

    match (outcome.mode, &outcome.playlist_url) {
        (TransferMode::DryRun, _) => out.push_str("\n[DRY RUN] No playlist created\n"),
        (TransferMode::Create, Some(url)) => {
            out.push_str(&format!("\nPlaylist created: {url}\n"))
        }
        (TransferMode::Create, None) => {
            out.push_str("\nNo tracks matched, no playlist created\n")
        }
    }

    if !report.unmatched_tracks.is_empty() {
        out.push_str("\nTracks not found:\n");
        for track in report.unmatched_tracks.iter().take(MAX_UNMATCHED_SHOWN) {
            out.push_str(&format!("  - {track}\n"));
        }
        if report.unmatched > MAX_UNMATCHED_SHOWN {
            out.push_str(&format!(
                "  ... and {} more\n",
                report.unmatched - MAX_UNMATCHED_SHOWN
            ));
        }
    }

    if let Some(path) = &outcome.unmatched_log {
        out.push_str(&format!("\nNot found tracks logged to: {}\n", path.display()));
    }

    out
}

pub fn duration_or_placeholder(seconds: Option<u32>) -> String {
    seconds
        .map(format_duration)
        .unwrap_or_else(|| "--:--".to_string())
}
