use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::song::SongId;

/// Curated gender/ensemble tag for an artist.
///
/// The common codes get their own variants; any other code from the
/// manually tagged lookup is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GenderTag {
    /// `m`
    Male,
    /// `f`
    Female,
    /// `d`: duos and mixed groups.
    Mixed,
    Other(String),
}

impl GenderTag {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
            Self::Mixed => "d",
            Self::Other(code) => code,
        }
    }
}

impl FromStr for GenderTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        match code.as_str() {
            "" => Err(Error::InvalidData("empty gender tag".to_string())),
            "m" => Ok(Self::Male),
            "f" => Ok(Self::Female),
            "d" => Ok(Self::Mixed),
            _ => Ok(Self::Other(code)),
        }
    }
}

impl TryFrom<String> for GenderTag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GenderTag> for String {
    fn from(value: GenderTag) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for GenderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the manually tagged artist lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderAssignment {
    pub artist_strip: String,
    pub gender: GenderTag,
}

impl GenderAssignment {
    #[must_use]
    pub fn new(artist: impl Into<String>, gender: GenderTag) -> Self {
        Self {
            artist_strip: artist.into(),
            gender,
        }
    }
}

/// Per-song metadata, one row per song identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub song_id: SongId,
    pub title: String,
    pub artist_strip: String,
    /// First week the song appeared on the chart.
    #[serde(rename = "min")]
    pub first_charted: NaiveDate,
    /// Last week the song appeared on the chart.
    #[serde(rename = "max")]
    pub last_charted: NaiveDate,
    pub min_rank: u32,
    pub year: i32,
    pub decade: i32,
    pub gender: Option<GenderTag>,
}

/// Floor a year to its decade (1987 → 1980).
#[must_use]
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Hit count for an artist within one decade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopArtist {
    pub decade: i32,
    pub artist_strip: String,
    pub num_hits: usize,
}
