//! Library construction: one metadata record per charting song.
//!
//! Built from the aggregated charts table: chart span, best rank, debut
//! year and decade per song, plus the artist's gender tag from the manual
//! lookup. The same pass emits the per-decade top artists (the worksheet
//! for manual tagging) and the sequence of number-one songs.

pub mod gender;
pub mod stage;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use stanza_core::model::{
    decade_of, is_scrape_artifact, ChartEntry, GenderTag, LibraryRecord, NumberOne, SongId,
    TopArtist,
};
use stanza_core::store::{Artifacts, Dataset};
use stanza_core::{Error, Result};

pub use gender::{resolve_genders, GenderOverrides};
pub use stage::LibraryStage;

/// Artists kept per decade in the top-artists worksheet.
pub const TOP_ARTISTS_PER_DECADE: usize = 200;

/// Chart span and best rank of one (title, primary artist) pair.
#[derive(Debug)]
struct SongSpan {
    title: String,
    artist: String,
    first: NaiveDate,
    last: NaiveDate,
    min_rank: u32,
}

/// Build one library record per song identity.
///
/// Songs whose primary artist is a scrape artifact are excluded. Records are
/// in order of first appearance in `charts`.
///
/// # Errors
/// Returns [`Error::Cardinality`] when two different (title, artist) pairs
/// produce the same song identity.
pub fn build_library(
    charts: &[ChartEntry],
    genders: &HashMap<String, GenderTag>,
) -> Result<Vec<LibraryRecord>> {
    let mut spans: Vec<SongSpan> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for entry in charts {
        if is_scrape_artifact(&entry.primary_artist) {
            continue;
        }
        let key = (entry.title.as_str(), entry.primary_artist.as_str());
        match index.get(&key) {
            Some(&i) => {
                let span = &mut spans[i];
                span.first = span.first.min(entry.date);
                span.last = span.last.max(entry.date);
                span.min_rank = span.min_rank.min(entry.rank);
            }
            None => {
                index.insert(key, spans.len());
                spans.push(SongSpan {
                    title: entry.title.clone(),
                    artist: entry.primary_artist.clone(),
                    first: entry.date,
                    last: entry.date,
                    min_rank: entry.rank,
                });
            }
        }
    }

    let mut ids: HashSet<SongId> = HashSet::with_capacity(spans.len());
    let mut library = Vec::with_capacity(spans.len());
    for span in spans {
        let song_id = SongId::new(&span.title, &span.artist);
        if !ids.insert(song_id.clone()) {
            return Err(Error::Cardinality {
                join: "song identity",
                key: song_id.to_string(),
                count: 2,
            });
        }

        let year = span.first.year();
        library.push(LibraryRecord {
            gender: genders.get(&span.artist).cloned(),
            song_id,
            title: span.title,
            artist_strip: span.artist,
            first_charted: span.first,
            last_charted: span.last,
            min_rank: span.min_rank,
            year,
            decade: decade_of(year),
        });
    }

    Ok(library)
}

/// The artists with the most distinct songs in each decade.
///
/// Decades are listed newest first; within a decade artists are ordered by
/// hit count, then name. At most `limit` artists are kept per decade.
#[must_use]
pub fn top_artists_by_decade(library: &[LibraryRecord], limit: usize) -> Vec<TopArtist> {
    let mut counts: BTreeMap<i32, HashMap<&str, usize>> = BTreeMap::new();
    for record in library {
        *counts
            .entry(record.decade)
            .or_default()
            .entry(record.artist_strip.as_str())
            .or_insert(0) += 1;
    }

    let mut top = Vec::new();
    for (decade, artists) in counts.into_iter().rev() {
        let mut ranked: Vec<(&str, usize)> = artists.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        top.extend(ranked.into_iter().take(limit).map(|(artist, num_hits)| TopArtist {
            decade,
            artist_strip: artist.to_string(),
            num_hits,
        }));
    }
    top
}

/// Chronological number-one songs, with consecutive weeks of the same
/// title collapsed into one entry.
#[must_use]
pub fn number_ones(charts: &[ChartEntry]) -> Vec<NumberOne> {
    let mut tops: Vec<&ChartEntry> = charts.iter().filter(|e| e.rank == 1).collect();
    tops.sort_by_key(|e| e.date);

    let mut sequence: Vec<NumberOne> = Vec::new();
    for entry in tops {
        if sequence.last().is_some_and(|prev| prev.title == entry.title) {
            continue;
        }
        sequence.push(NumberOne {
            date: entry.date,
            title: entry.title.clone(),
            primary_artist: entry.primary_artist.clone(),
        });
    }
    sequence
}

/// Row counts written by [`run_library`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LibrarySummary {
    pub songs: usize,
    pub tagged: usize,
    pub top_artists: usize,
    pub number_ones: usize,
}

/// Rebuild the library, top-artists and number-one datasets from the
/// stored charts table.
///
/// A missing gender table is not an error: the library is written without
/// tags so the top-artists worksheet can be produced for tagging.
///
/// # Errors
/// Returns an error if the charts table is missing, a join violates its
/// cardinality, or a dataset cannot be written.
pub fn run_library(
    artifacts: &Artifacts,
    gender_table: &str,
    overrides: &GenderOverrides,
) -> Result<LibrarySummary> {
    let charts: Vec<ChartEntry> = artifacts.load(&Dataset::Charts)?;

    let lookup = Dataset::GenderLookup(gender_table.to_string());
    let genders = if artifacts.exists(&lookup)? {
        let rows = artifacts.load::<gender::LookupRow>(&lookup)?;
        resolve_genders(gender::parse_lookup(rows)?, overrides)?
    } else {
        log::warn!(
            "No gender table at {}; library will have no gender tags",
            artifacts.key(&lookup)
        );
        HashMap::new()
    };

    let library = build_library(&charts, &genders)?;
    artifacts.save(&Dataset::Library, &library)?;

    let top = top_artists_by_decade(&library, TOP_ARTISTS_PER_DECADE);
    artifacts.save(&Dataset::TopArtistsByDecade, &top)?;

    let ones = number_ones(&charts);
    artifacts.save(&Dataset::NumberOnes, &ones)?;

    let summary = LibrarySummary {
        songs: library.len(),
        tagged: library.iter().filter(|r| r.gender.is_some()).count(),
        top_artists: top.len(),
        number_ones: ones.len(),
    };
    log::info!(
        "Library built: {} songs ({} with gender), {} top artists, {} number ones",
        summary.songs,
        summary.tagged,
        summary.top_artists,
        summary.number_ones
    );
    Ok(summary)
}
