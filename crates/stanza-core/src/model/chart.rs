use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::song::{primary_artist, SongId};

/// One ranked row of a weekly chart, as scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    #[serde(rename = "song")]
    pub title: String,
    pub artist: String,
    pub rank: u32,
    pub date: NaiveDate,
}

/// One week's ranked list of songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSnapshot {
    pub date: NaiveDate,
    pub rows: Vec<ChartRow>,
}

impl ChartSnapshot {
    #[must_use]
    pub fn new(date: NaiveDate, rows: Vec<ChartRow>) -> Self {
        Self { date, rows }
    }
}

/// A chart row after aggregation: lowercased title plus derived primary artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub title: String,
    pub artist: String,
    #[serde(rename = "artist_strip")]
    pub primary_artist: String,
    pub rank: u32,
    pub date: NaiveDate,
}

impl ChartEntry {
    #[must_use]
    pub fn from_row(row: ChartRow) -> Self {
        let primary = primary_artist(&row.artist);
        Self {
            title: row.title.to_lowercase(),
            artist: row.artist,
            primary_artist: primary,
            rank: row.rank,
            date: row.date,
        }
    }

    #[must_use]
    pub fn song_id(&self) -> SongId {
        SongId::new(&self.title, &self.primary_artist)
    }
}

/// A week in which a song held the top position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberOne {
    pub date: NaiveDate,
    pub title: String,
    #[serde(rename = "artist_strip")]
    pub primary_artist: String,
}
