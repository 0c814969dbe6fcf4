//! Durable storage for pipeline artifacts.
//!
//! Every table the pipeline produces is written to an [`ObjectStore`] under
//! a bucket and a folder-prefixed key. [`Artifacts`] maps logical
//! [`Dataset`] names onto those keys and handles the CSV encoding.

pub mod fs;
pub mod migrations;
pub mod sqlite;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::HierarchyTable;
use crate::table;

pub use fs::FsStore;
pub use sqlite::SqliteStore;

/// Prefix of the weekly snapshot file names.
const SNAPSHOT_PREFIX: &str = "CHARTS_";

/// Key/value object storage addressed by bucket-relative keys.
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Read an object, or `None` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite an object.
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// List keys starting with `prefix`, in lexicographic order.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Which [`ObjectStore`] implementation backs a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One file per object under `<root>/<bucket>/`.
    #[default]
    Fs,
    /// One row per object in `<root>/<bucket>.db`.
    Sqlite,
}

/// Open the store for `bucket` under `root`.
pub fn open_store(backend: StoreBackend, root: &Path, bucket: &str) -> Result<Box<dyn ObjectStore>> {
    if bucket.is_empty() || bucket.contains(['/', '\\']) {
        return Err(Error::InvalidData(format!("invalid bucket name: {bucket:?}")));
    }
    match backend {
        StoreBackend::Fs => Ok(Box::new(FsStore::open(root.join(bucket))?)),
        StoreBackend::Sqlite => {
            std::fs::create_dir_all(root)?;
            Ok(Box::new(SqliteStore::open(root.join(format!("{bucket}.db")), bucket)?))
        }
    }
}

/// Logical names of the tables the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// One scraped week.
    ChartSnapshot(NaiveDate),
    Charts,
    Library,
    TopArtistsByDecade,
    NumberOnes,
    /// The manually tagged artist lookup, by file name.
    GenderLookup(String),
    Lyrics,
    Corpus,
    CorpusReduced,
    Sections,
    Lines,
    Tokens,
}

impl Dataset {
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::ChartSnapshot(date) => format!("{SNAPSHOT_PREFIX}{date}.csv"),
            Self::Charts => "CHARTS.csv".to_string(),
            Self::Library => "LIB.csv".to_string(),
            Self::TopArtistsByDecade => "top_artists_decade.csv".to_string(),
            Self::NumberOnes => "TOP_SONGS_ORDER.csv".to_string(),
            Self::GenderLookup(name) => name.clone(),
            Self::Lyrics => "LYRICS.csv".to_string(),
            Self::Corpus => "CORPUS.csv".to_string(),
            Self::CorpusReduced => "CORPUS-REDUCED.csv".to_string(),
            Self::Sections => "SECTION-REDUCED.csv".to_string(),
            Self::Lines => "LINE-REDUCED.csv".to_string(),
            Self::Tokens => "TOKEN-REDUCED.csv".to_string(),
        }
    }

    /// Object key under `folder`. Weekly snapshots live in `charts/`.
    #[must_use]
    pub fn key(&self, folder: &str) -> String {
        match self {
            Self::ChartSnapshot(_) => format!("{folder}/charts/{}", self.file_name()),
            _ => format!("{folder}/{}", self.file_name()),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Typed access to the datasets of one bucket folder.
#[derive(Debug)]
pub struct Artifacts {
    store: Box<dyn ObjectStore>,
    folder: String,
}

impl Artifacts {
    #[must_use]
    pub fn new(store: Box<dyn ObjectStore>, folder: impl Into<String>) -> Self {
        Self {
            store,
            folder: folder.into(),
        }
    }

    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    #[must_use]
    pub fn key(&self, dataset: &Dataset) -> String {
        dataset.key(&self.folder)
    }

    pub fn exists(&self, dataset: &Dataset) -> Result<bool> {
        self.store.exists(&self.key(dataset))
    }

    fn read(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let key = self.key(dataset);
        self.store.get(&key)?.ok_or(Error::NotFound {
            entity: "dataset",
            id: key,
        })
    }

    /// Load a typed table; a missing dataset is an error.
    pub fn load<T: DeserializeOwned>(&self, dataset: &Dataset) -> Result<Vec<T>> {
        table::read_rows(&self.read(dataset)?)
    }

    /// Load a typed table, treating a missing dataset as empty.
    pub fn load_or_empty<T: DeserializeOwned>(&self, dataset: &Dataset) -> Result<Vec<T>> {
        match self.store.get(&self.key(dataset))? {
            Some(bytes) => table::read_rows(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite a typed table.
    pub fn save<T: Serialize>(&self, dataset: &Dataset, rows: &[T]) -> Result<()> {
        let bytes = table::write_rows(rows)?;
        self.store.put(&self.key(dataset), &bytes)?;
        log::debug!("Saved {} rows to {}", rows.len(), self.key(dataset));
        Ok(())
    }

    /// Row count of a stored dataset, or `None` when it does not exist.
    pub fn row_count(&self, dataset: &Dataset) -> Result<Option<usize>> {
        self.store
            .get(&self.key(dataset))?
            .map(|bytes| table::count_rows(&bytes))
            .transpose()
    }

    /// Store an externally produced file, such as the tagged gender table,
    /// under a dataset key without re-encoding it.
    pub fn put_bytes(&self, dataset: &Dataset, body: &[u8]) -> Result<()> {
        self.store.put(&self.key(dataset), body)
    }

    pub fn load_table(&self, dataset: &Dataset, depth: usize) -> Result<HierarchyTable> {
        HierarchyTable::from_csv(&self.read(dataset)?, depth)
    }

    pub fn save_table(&self, dataset: &Dataset, table: &HierarchyTable) -> Result<()> {
        self.store.put(&self.key(dataset), &table.to_csv()?)?;
        log::debug!("Saved {} rows to {}", table.len(), self.key(dataset));
        Ok(())
    }

    /// Dates of the weekly snapshots already in the store.
    pub fn snapshot_dates(&self) -> Result<Vec<NaiveDate>> {
        let prefix = format!("{}/charts/", self.folder);
        let dates = self
            .store
            .list(&prefix)?
            .iter()
            .filter_map(|key| snapshot_date(key))
            .collect();
        Ok(dates)
    }
}

/// Parse the date out of a `.../CHARTS_<date>.csv` key.
fn snapshot_date(key: &str) -> Option<NaiveDate> {
    let name = key.rsplit('/').next()?;
    let date = name.strip_prefix(SNAPSHOT_PREFIX)?.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
