use std::collections::{HashMap, HashSet};

use serde::Serialize;

use stanza_core::model::{HierarchyTable, LibraryRecord, Level, LyricsRecord, SongId};
use stanza_core::store::{Artifacts, Dataset};
use stanza_core::{Error, Result};

use crate::corpus::collapse::{collapse, CollapseStep};
use crate::corpus::prep::prep_for_analysis;
use crate::corpus::{DEFAULT_MAX_SONG_WORDS, LYRICS_COLUMN, PREPPED_COLUMN};

/// Settings for [`build_corpus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    /// Songs with this many words or more are pruned.
    pub max_song_words: usize,
    /// Collapses applied after pruning, outermost first.
    pub steps: Vec<CollapseStep>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            max_song_words: DEFAULT_MAX_SONG_WORDS,
            steps: vec![
                CollapseStep::sections(),
                CollapseStep::lines(),
                CollapseStep::tokens(),
            ],
        }
    }
}

impl CorpusOptions {
    #[must_use]
    pub fn with_max_song_words(mut self, max_song_words: usize) -> Self {
        self.max_song_words = max_song_words;
        self
    }
}

/// Row counts of every corpus table written by [`build_corpus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub songs: usize,
    pub reduced: usize,
    pub sections: usize,
    pub lines: usize,
    pub tokens: usize,
}

/// Join found lyrics with the library into a song-level table.
///
/// Sentinel rows are dropped and songs missing from the library are left
/// out. Rows follow the order of the lyrics table.
///
/// # Errors
/// Returns [`Error::Cardinality`] if a song appears twice in the lyrics.
pub fn merge_corpus(library: &[LibraryRecord], lyrics: &[LyricsRecord]) -> Result<HierarchyTable> {
    let by_id: HashMap<&SongId, &LibraryRecord> =
        library.iter().map(|record| (&record.song_id, record)).collect();

    let mut seen: HashSet<&SongId> = HashSet::new();
    let mut corpus = HierarchyTable::new(Level::Title.depth(), vec![LYRICS_COLUMN.to_string()])?;
    for record in lyrics {
        if !seen.insert(&record.song_id) {
            return Err(Error::Cardinality {
                join: "lyrics",
                key: record.song_id.to_string(),
                count: 2,
            });
        }
        let Some(text) = record.lyrics.text() else {
            continue;
        };
        let Some(song) = by_id.get(&record.song_id) else {
            log::debug!("Lyrics for {} have no library record", record.song_id);
            continue;
        };
        corpus.push(
            vec![
                song.decade.to_string(),
                song.year.to_string(),
                song.gender.as_ref().map(ToString::to_string).unwrap_or_default(),
                song.artist_strip.clone(),
                song.title.clone(),
            ],
            vec![text.to_string()],
        )?;
    }
    Ok(corpus)
}

/// Number of space-separated pieces in the raw lyrics.
///
/// Splits on the space character only: words joined by a newline count as
/// one piece, which is the count the word limit was calibrated against.
#[must_use]
pub fn word_count(lyrics: &str) -> usize {
    lyrics.split(' ').count()
}

/// Keep songs with fewer than `max_song_words` words and add the
/// normalized text next to the raw lyrics.
///
/// # Errors
/// Returns an error if `corpus` has no lyrics column.
pub fn reduce_corpus(corpus: &HierarchyTable, max_song_words: usize) -> Result<HierarchyTable> {
    let lyrics = corpus.column_index(LYRICS_COLUMN)?;
    let mut reduced = HierarchyTable::new(
        corpus.depth(),
        vec![LYRICS_COLUMN.to_string(), PREPPED_COLUMN.to_string()],
    )?;

    for row in corpus.rows() {
        let text = &row.values[lyrics];
        if word_count(text) >= max_song_words {
            log::debug!("Pruning {} ({} words)", row.keys.join("/"), word_count(text));
            continue;
        }
        reduced.push(row.keys.clone(), vec![text.clone(), prep_for_analysis(text)])?;
    }

    log::info!(
        "Kept {} of {} songs under {} words",
        reduced.len(),
        corpus.len(),
        max_song_words
    );
    Ok(reduced)
}

/// Collapse a stored table into the next level and store the result.
/// Returns the number of rows written.
///
/// # Errors
/// Returns an error if the input table is missing or malformed.
pub fn collapse_and_save(artifacts: &Artifacts, step: &CollapseStep) -> Result<usize> {
    let input = step.input()?;
    let table = artifacts.load_table(&input, step.level.depth() - 1)?;
    let collapsed = collapse(&table, step)?;
    artifacts.save_table(&step.output()?, &collapsed)?;
    Ok(collapsed.len())
}

/// Rebuild every corpus table from the stored library and lyrics.
///
/// # Errors
/// Returns an error if an input is missing, a join violates its cardinality,
/// or a table cannot be written.
pub fn build_corpus(artifacts: &Artifacts, options: &CorpusOptions) -> Result<CorpusSummary> {
    let library: Vec<LibraryRecord> = artifacts.load(&Dataset::Library)?;
    let lyrics: Vec<LyricsRecord> = artifacts.load(&Dataset::Lyrics)?;

    let corpus = merge_corpus(&library, &lyrics)?;
    artifacts.save_table(&Dataset::Corpus, &corpus)?;
    log::info!("Corpus has {} songs with lyrics", corpus.len());

    let reduced = reduce_corpus(&corpus, options.max_song_words)?;
    artifacts.save_table(&Dataset::CorpusReduced, &reduced)?;

    let mut summary = CorpusSummary {
        songs: corpus.len(),
        reduced: reduced.len(),
        ..CorpusSummary::default()
    };
    for step in &options.steps {
        let rows = collapse_and_save(artifacts, step)?;
        log::info!("Wrote {} {} rows", rows, step.level);
        match step.level {
            Level::Section => summary.sections = rows,
            Level::Line => summary.lines = rows,
            Level::Token => summary.tokens = rows,
            _ => {}
        }
    }
    Ok(summary)
}
