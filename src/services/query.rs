use regex::Regex;
use std::sync::LazyLock;

use crate::domain::track::SourceTrack;

static BRACKETED_FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[\(\[](?:feat\.?|ft\.?|featuring|with)\s[^\)\]]*[\)\]]").unwrap()
});

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\(\[][^\(\)\[\]]*[\)\]]").unwrap());

// "Title - Remastered 2009", "Title - 2011 Remaster", "Title - Live at Wembley".
// The keyword has to sit right after the dash so "Oasis - Live Forever" survives.
static DASH_EDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+[-–—]\s+(?:\d{4}\s+)?(?:(?:digital\s+)?remaster(?:ed)?(?:\s+\d{4})?(?:\s+version)?|live(?:\s+(?:at|from|in)\s.*)?|acoustic(?:\s+version)?|mono|stereo|demo(?:\s+version)?)\s*$",
    )
    .unwrap()
});

// "Title - Radio Edit", "Title - Skrillex Remix", "Title - Single Version"
static DASH_MIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+[-–—]\s+(?:[^-–—]*\s)?(?:remix|mix|edit|version)\s*$").unwrap()
});

static TRAILING_FEATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s.*$").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Drops featuring credits, bracketed annotations and edition suffixes.
/// Falls back to the trimmed input when nothing would be left.
pub fn clean_title(title: &str) -> String {
    let cleaned = BRACKETED_FEATURE_RE.replace_all(title, "");
    let cleaned = BRACKETED_RE.replace_all(&cleaned, "");
    let cleaned = DASH_EDITION_RE.replace(&cleaned, "");
    let cleaned = DASH_MIX_RE.replace(&cleaned, "");
    let cleaned = TRAILING_FEATURE_RE.replace(&cleaned, "");
    let cleaned = collapse_whitespace(&cleaned);

    if cleaned.is_empty() {
        collapse_whitespace(title)
    } else {
        cleaned
    }
}

/// Search string sent to the destination: `"{artist} {cleaned title}"`.
pub fn build_query(track: &SourceTrack) -> String {
    collapse_whitespace(&format!("{} {}", track.artist, clean_title(&track.title)))
}

/// Comparison key: cleaned, lower-cased, punctuation-free.
pub fn normalize(text: &str) -> String {
    let cleaned = clean_title(text).to_lowercase().replace('&', " and ");
    let mapped: String = cleaned
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&mapped)
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}
