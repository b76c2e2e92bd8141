use std::collections::HashSet;

use crate::domain::matching::{MatchResult, UnmatchedReason};
use crate::domain::track::{Candidate, SourceTrack};
use crate::services::query::normalize;

pub const TITLE_WEIGHT: f64 = 0.6;
pub const ARTIST_WEIGHT: f64 = 0.4;
pub const CLOSE_DURATION_SECS: u32 = 2;
pub const LOOSE_DURATION_SECS: u32 = 10;
pub const CLOSE_DURATION_BONUS: f64 = 0.1;
pub const FAR_DURATION_PENALTY: f64 = 0.15;
pub const ACCEPT_THRESHOLD: f64 = 0.65;

/// Highest score a candidate can reach.
pub const MAX_SCORE: f64 = TITLE_WEIGHT + ARTIST_WEIGHT + CLOSE_DURATION_BONUS;

/// Picks the best candidate for `source`. Candidates are walked in the
/// order the destination ranked them and only a strictly higher score
/// displaces the current leader, so ties go to the earlier result.
pub fn select_best(source: &SourceTrack, candidates: &[Candidate]) -> MatchResult {
    let mut best: Option<(&Candidate, f64)> = None;

    for candidate in candidates {
        let score = score_candidate(source, candidate);
        tracing::debug!("  {score:.3} {candidate}");
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }

    match best {
        None => MatchResult::Unmatched {
            source: source.clone(),
            reason: UnmatchedReason::NoCandidates,
        },
        Some((_, score)) if score < ACCEPT_THRESHOLD => MatchResult::Unmatched {
            source: source.clone(),
            reason: UnmatchedReason::ScoreBelowThreshold,
        },
        Some((candidate, score)) => MatchResult::Matched {
            source: source.clone(),
            candidate: candidate.clone(),
            score,
        },
    }
}

pub fn score_candidate(source: &SourceTrack, candidate: &Candidate) -> f64 {
    let source_title = normalize(&source.title);
    let source_artist = normalize(&source.artist);
    let candidate_artist = normalize(&candidate.artist);
    let candidate_title = strip_artist_prefix(
        &normalize(&candidate.title),
        &[&candidate_artist, &source_artist],
    );

    let title = text_similarity(&source_title, &candidate_title);
    let artist = text_similarity(&source_artist, &candidate_artist);

    TITLE_WEIGHT * title
        + ARTIST_WEIGHT * artist
        + duration_adjustment(source.duration_seconds, candidate.duration_seconds)
}

/// 1.0 for equal keys, otherwise a blend of how much of `expected` is
/// covered and how much the two token sets overlap.
fn text_similarity(expected: &str, actual: &str) -> f64 {
    if expected.is_empty() || actual.is_empty() {
        return 0.0;
    }
    if expected == actual {
        return 1.0;
    }

    let expected_tokens: HashSet<&str> = expected.split(' ').collect();
    let actual_tokens: HashSet<&str> = actual.split(' ').collect();
    let shared = expected_tokens.intersection(&actual_tokens).count() as f64;

    let containment = shared / expected_tokens.len() as f64;
    let dice = 2.0 * shared / (expected_tokens.len() + actual_tokens.len()) as f64;
    let overlap = (containment + dice) / 2.0;

    // Single-token keys ("beyonce" vs "beyoncé") get no overlap credit, so
    // fall back to edit distance for near-identical spellings.
    let spelling = strsim::normalized_levenshtein(expected, actual);
    if spelling >= 0.85 {
        overlap.max(spelling * 0.9)
    } else {
        overlap
    }
}

fn duration_adjustment(source: Option<u32>, candidate: Option<u32>) -> f64 {
    let (Some(a), Some(b)) = (source, candidate) else {
        return 0.0;
    };
    let delta = a.abs_diff(b);
    if delta <= CLOSE_DURATION_SECS {
        CLOSE_DURATION_BONUS
    } else if delta <= LOOSE_DURATION_SECS {
        0.0
    } else {
        -FAR_DURATION_PENALTY
    }
}

// Video titles often read "Artist - Title"; drop the leading artist.
fn strip_artist_prefix(title: &str, artists: &[&str]) -> String {
    for artist in artists {
        if artist.is_empty() {
            continue;
        }
        if let Some(rest) = title.strip_prefix(artist).and_then(|r| r.strip_prefix(' ')) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, artist: &str, title: &str, duration: Option<u32>) -> Candidate {
        Candidate {
            id: id.to_string(),
            artist: artist.to_string(),
            title: title.to_string(),
            album: None,
            duration_seconds: duration,
        }
    }

    #[test]
    fn exact_match_scores_near_maximum() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible").with_duration(136);
        let candidates = vec![candidate("abc", "Arcade Fire", "Neon Bible", Some(137))];

        match select_best(&source, &candidates) {
            MatchResult::Matched {
                candidate, score, ..
            } => {
                assert_eq!(candidate.id, "abc");
                assert!(score >= MAX_SCORE - 1e-9, "score {score}");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn empty_candidates_are_unmatched() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible");
        let result = select_best(&source, &[]);
        assert_eq!(
            result,
            MatchResult::Unmatched {
                source,
                reason: UnmatchedReason::NoCandidates
            }
        );
    }

    #[test]
    fn unrelated_candidates_fall_below_threshold() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible");
        let candidates = vec![
            candidate("x", "Metallica", "Enter Sandman", Some(331)),
            candidate("y", "Taylor Swift", "Shake It Off", None),
        ];
        assert!(matches!(
            select_best(&source, &candidates),
            MatchResult::Unmatched {
                reason: UnmatchedReason::ScoreBelowThreshold,
                ..
            }
        ));
    }

    #[test]
    fn same_artist_wrong_song_is_rejected() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible");
        let candidates = vec![candidate("x", "Arcade Fire", "Wake Up", None)];
        assert!(!select_best(&source, &candidates).is_matched());
    }

    #[test]
    fn ties_go_to_the_earlier_candidate() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible");
        let candidates = vec![
            candidate("first", "Arcade Fire", "Neon Bible", None),
            candidate("second", "Arcade Fire", "Neon Bible", None),
        ];
        let result = select_best(&source, &candidates);
        assert_eq!(result.candidate().map(|c| c.id.as_str()), Some("first"));
    }

    #[test]
    fn later_candidate_wins_on_higher_score() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible").with_duration(136);
        let candidates = vec![
            candidate("live", "Arcade Fire", "Neon Bible", Some(190)),
            candidate("studio", "Arcade Fire", "Neon Bible", Some(136)),
        ];
        let result = select_best(&source, &candidates);
        assert_eq!(result.candidate().map(|c| c.id.as_str()), Some("studio"));
    }

    #[test]
    fn duration_penalty_does_not_disqualify() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible").with_duration(136);
        let candidates = vec![candidate("long", "Arcade Fire", "Neon Bible", Some(400))];
        assert!(select_best(&source, &candidates).is_matched());
    }

    #[test]
    fn video_style_titles_still_match() {
        let source = SourceTrack::new("Arcade Fire", "Neon Bible");
        let candidates = vec![
            candidate("a", "Some Uploader", "Cooking Show Highlights", None),
            candidate("b", "Arcade Fire", "Arcade Fire - Neon Bible (Official Audio)", None),
        ];
        let result = select_best(&source, &candidates);
        assert_eq!(result.candidate().map(|c| c.id.as_str()), Some("b"));
    }

    #[test]
    fn song_names_with_edition_words_still_match() {
        let source = SourceTrack::new("Oasis", "Live Forever").with_duration(277);
        let candidates = vec![candidate(
            "lf",
            "Oasis",
            "Oasis - Live Forever (Official Video)",
            Some(277),
        )];
        let result = select_best(&source, &candidates);
        assert_eq!(result.candidate().map(|c| c.id.as_str()), Some("lf"));
    }

    #[test]
    fn annotated_source_title_matches_plain_candidate() {
        let source = SourceTrack::new("Artist", "Song Title (feat. Other Artist) - Remastered 2009");
        let candidates = vec![candidate("v", "Artist", "Song Title", None)];
        assert!(select_best(&source, &candidates).is_matched());
    }

    #[test]
    fn selection_is_deterministic_and_from_input() {
        let source = SourceTrack::new("Radiohead", "Karma Police").with_duration(264);
        let candidates = vec![
            candidate("1", "Radiohead", "Karma Police (Live)", Some(280)),
            candidate("2", "Radiohead", "Karma Police", Some(263)),
            candidate("3", "Radiohead", "Paranoid Android", Some(387)),
        ];
        let first = select_best(&source, &candidates);
        let second = select_best(&source, &candidates);
        assert_eq!(first, second);
        let chosen = first.candidate().expect("should match");
        assert!(candidates.contains(chosen));
    }
}
