pub mod charts;
pub mod config;
pub mod corpus;
pub mod library;
pub mod lyrics;
pub mod run;
pub mod status;

pub use charts::run_charts;
pub use corpus::run_corpus;
pub use library::run_library;
pub use lyrics::run_lyrics;
pub use run::run_pipeline;
pub use status::show_status;
