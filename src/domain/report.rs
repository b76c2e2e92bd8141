use super::matching::MatchResult;
use super::track::SourceTrack;

/// Summary of a finished run, derived only from its match results.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub match_rate: f64,
    pub unmatched_tracks: Vec<SourceTrack>,
}

impl TransferReport {
    pub fn build(results: &[MatchResult]) -> Self {
        let total = results.len();
        let unmatched_tracks: Vec<SourceTrack> = results
            .iter()
            .filter(|r| !r.is_matched())
            .map(|r| r.source().clone())
            .collect();
        let unmatched = unmatched_tracks.len();
        let matched = total - unmatched;
        let match_rate = if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        };

        Self {
            total,
            matched,
            unmatched,
            match_rate,
            unmatched_tracks,
        }
    }
}
