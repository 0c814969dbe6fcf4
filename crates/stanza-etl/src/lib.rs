//! ETL pipeline stages for stanza.
//!
//! Implements the charts, library, lyrics and corpus stages as treadle
//! `Stage` implementations, plus the scrapers and API clients they drive.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod charts;
pub mod config;
pub mod corpus;
pub mod error;
mod html;
pub mod library;
pub mod lyrics;
pub mod pipeline;
pub mod work_item;

pub use charts::{BillboardClient, ChartSource, ChartsStage};
pub use config::Config;
pub use corpus::{CorpusOptions, CorpusStage};
pub use error::{FetchError, FetchResult};
pub use library::{GenderOverrides, LibraryStage};
pub use lyrics::{GeniusClient, LyricsApi, LyricsStage, RetryPolicy};
pub use pipeline::{advance_run, build_pipeline, build_pipeline_with, prepare_run, RunStart};
pub use work_item::PipelineRun;
