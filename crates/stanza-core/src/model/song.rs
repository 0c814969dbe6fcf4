use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrings that introduce a collaborator in a chart artist credit.
///
/// Everything from the first match onward is dropped when deriving the
/// primary artist.
pub const COLLABORATOR_DELIMITERS: [&str; 4] = [" x ", "featuring", " duet ", " with "];

/// Values the chart page places in the artist slot that are not artists.
pub const SCRAPE_ARTIFACTS: [&str; 2] = ["new", "re-entry"];

/// Derive the primary artist from a chart artist credit.
///
/// The credit is lowercased, embedded newlines are removed, and the text is
/// cut at the first collaborator delimiter. Credits without a delimiter pass
/// through (lowercased and trimmed).
#[must_use]
pub fn primary_artist(artist: &str) -> String {
    let lowered = artist.to_lowercase().replace('\n', "");
    let mut primary = lowered.as_str();
    for delimiter in COLLABORATOR_DELIMITERS {
        if let Some(pos) = primary.find(delimiter) {
            primary = &primary[..pos];
        }
    }
    primary.trim().to_string()
}

/// Returns `true` for primary-artist values that are scrape artifacts.
#[must_use]
pub fn is_scrape_artifact(primary_artist: &str) -> bool {
    SCRAPE_ARTIFACTS.contains(&primary_artist)
}

/// Deduplication and join key for a song: `<title>-<primary artist>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    /// Build the identity from an already-normalized title and primary artist.
    #[must_use]
    pub fn new(title: &str, primary_artist: &str) -> Self {
        Self(format!("{title}-{primary_artist}"))
    }

    /// Wrap an identity read back from a persisted table.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SongId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
