//! Corpus construction.
//!
//! Lyrics are joined with the library and indexed by decade, year, gender,
//! artist and title. Overlong songs are pruned, the remaining text is
//! normalized, and each song is then split into sections, lines and tokens.
//! Every level is persisted, so the tables can be rebuilt one step at a
//! time.

pub mod build;
pub mod collapse;
pub mod prep;
pub mod stage;

pub use build::{build_corpus, collapse_and_save, merge_corpus, reduce_corpus, CorpusOptions, CorpusSummary};
pub use collapse::{collapse, fragment_count, CollapseStep};
pub use prep::prep_for_analysis;
pub use stage::CorpusStage;

/// Raw lyrics column of the song-level tables.
pub const LYRICS_COLUMN: &str = "lyrics";

/// Normalized lyrics column of the reduced corpus.
pub const PREPPED_COLUMN: &str = "prepped";

/// Default word limit for a song to stay in the corpus.
pub const DEFAULT_MAX_SONG_WORDS: usize = 1000;
