pub mod chart;
pub mod hierarchy;
pub mod library;
pub mod lyrics;
pub mod song;

pub use chart::{ChartEntry, ChartRow, ChartSnapshot, NumberOne};
pub use hierarchy::{HierarchyRow, HierarchyTable, Level};
pub use library::{decade_of, GenderAssignment, GenderTag, LibraryRecord, TopArtist};
pub use lyrics::{Lyrics, LyricsRecord, SONG_NOT_FOUND};
pub use song::{is_scrape_artifact, primary_artist, SongId};
