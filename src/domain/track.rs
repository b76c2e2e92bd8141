use std::fmt;

/// A track read from the playlist being exported. Its identity is its
/// position in that playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTrack {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl SourceTrack {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
            duration_seconds: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

impl fmt::Display for SourceTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// A destination search hit. `id` is opaque to the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} [{}]", self.artist, self.title, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct SourcePlaylist {
    pub name: String,
    pub tracks: Vec<SourceTrack>,
}

pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
