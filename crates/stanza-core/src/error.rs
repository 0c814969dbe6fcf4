use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A join produced more matches per key than its declared cardinality allows.
    #[error("cardinality violation in {join} join: {key} matched {count} rows")]
    Cardinality {
        join: &'static str,
        key: String,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
