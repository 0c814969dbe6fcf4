use serde::{Deserialize, Serialize};

use crate::model::song::SongId;

/// Stored in place of lyrics when the lyrics API has no match for a song.
pub const SONG_NOT_FOUND: &str = "song not found";

/// Lyrics for one song, or the marker that none were found.
///
/// Persisted as plain text; [`Lyrics::NotFound`] round-trips through
/// [`SONG_NOT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Lyrics {
    Found(String),
    NotFound,
}

impl Lyrics {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Found(text) => Some(text),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<String> for Lyrics {
    fn from(value: String) -> Self {
        if value == SONG_NOT_FOUND {
            Self::NotFound
        } else {
            Self::Found(value)
        }
    }
}

impl From<Lyrics> for String {
    fn from(value: Lyrics) -> Self {
        match value {
            Lyrics::Found(text) => text,
            Lyrics::NotFound => SONG_NOT_FOUND.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsRecord {
    pub song_id: SongId,
    pub lyrics: Lyrics,
}

impl LyricsRecord {
    #[must_use]
    pub fn new(song_id: SongId, lyrics: Lyrics) -> Self {
        Self { song_id, lyrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_maps_to_not_found() {
        assert_eq!(Lyrics::from(SONG_NOT_FOUND.to_string()), Lyrics::NotFound);
        assert_eq!(String::from(Lyrics::NotFound), "song not found");
    }

    #[test]
    fn test_found_text() {
        let lyrics = Lyrics::from("hello darlin".to_string());
        assert!(lyrics.is_found());
        assert_eq!(lyrics.text(), Some("hello darlin"));
        assert_eq!(Lyrics::NotFound.text(), None);
    }
}
