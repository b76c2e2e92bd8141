use std::fmt;

use super::track::{Candidate, SourceTrack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    NoCandidates,
    ScoreBelowThreshold,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::NoCandidates => write!(f, "no candidates"),
            UnmatchedReason::ScoreBelowThreshold => write!(f, "score below threshold"),
        }
    }
}

/// Outcome of matching one source track. A run produces exactly one of
/// these per source track, in playlist order.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched {
        source: SourceTrack,
        candidate: Candidate,
        score: f64,
    },
    Unmatched {
        source: SourceTrack,
        reason: UnmatchedReason,
    },
}

impl MatchResult {
    pub fn source(&self) -> &SourceTrack {
        match self {
            MatchResult::Matched { source, .. } | MatchResult::Unmatched { source, .. } => source,
        }
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            MatchResult::Matched { candidate, .. } => Some(candidate),
            MatchResult::Unmatched { .. } => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// Which way a run ends: dry runs never touch the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    DryRun,
    Create,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 1-based position of the track just processed.
    pub index: usize,
    pub total: usize,
    pub percent: f64,
    pub display_label: String,
}

impl ProgressEvent {
    pub fn new(index: usize, total: usize, track: &SourceTrack) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            index as f64 / total as f64 * 100.0
        };
        Self {
            index,
            total,
            percent,
            display_label: track.to_string(),
        }
    }
}
