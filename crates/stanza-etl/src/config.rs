use anyhow::{Context, Result};
use chrono::NaiveDate;
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use stanza_core::store::{open_store, Artifacts, StoreBackend};
use std::path::PathBuf;
use std::time::Duration;

use crate::charts::BillboardClient;
use crate::corpus::CorpusOptions;
use crate::library::GenderOverrides;
use crate::lyrics::resilience::RetryPolicy;
use crate::lyrics::GeniusClient;

/// Configuration for stanza.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (STANZA_* prefix)
/// 3. Config file (~/.config/stanza/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Object store implementation: `fs` or `sqlite`.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Directory holding the buckets.
    ///
    /// Can be set via:
    /// - CLI: --store-root /path
    /// - ENV: STANZA_STORE_ROOT
    /// - Default: ~/.local/share/stanza
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Bucket name (one per chart, e.g. country or pop).
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Folder prefix for every dataset key inside the bucket.
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Chart page URL; the chart date is appended.
    #[serde(default = "default_chart_url")]
    pub chart_url: String,

    /// Oldest chart week to scrape.
    #[serde(default = "default_first_chart_date")]
    pub first_chart_date: NaiveDate,

    /// User agent sent to the chart site and the lyrics API.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL of the lyrics API.
    #[serde(default = "default_lyrics_api_base")]
    pub lyrics_api_base: String,

    /// Lyrics API access token (required for the lyrics step).
    ///
    /// Can be set via:
    /// - ENV: STANZA_LYRICS_ACCESS_TOKEN
    /// - Config: lyrics_access_token = "..."
    pub lyrics_access_token: Option<String>,

    /// File name of the manually tagged artist gender table.
    #[serde(default = "default_gender_table")]
    pub gender_table: String,

    /// Optional TOML file with extra artist gender overrides.
    pub gender_overrides_path: Option<PathBuf>,

    /// Songs with this many words or more are dropped from the corpus.
    #[serde(default = "default_max_song_words")]
    pub max_song_words: usize,

    /// Attempts per lyrics request before the song is skipped for the round.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: usize,

    #[serde(default = "default_retry_min_delay_ms")]
    pub retry_min_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Passes over the missing songs before lyrics retrieval gives up.
    #[serde(default = "default_lyrics_max_rounds")]
    pub lyrics_max_rounds: usize,

    /// Default log filter when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            store_root: default_store_root(),
            bucket: default_bucket(),
            folder: default_folder(),
            chart_url: default_chart_url(),
            first_chart_date: default_first_chart_date(),
            user_agent: default_user_agent(),
            lyrics_api_base: default_lyrics_api_base(),
            lyrics_access_token: None,
            gender_table: default_gender_table(),
            gender_overrides_path: None,
            max_song_words: default_max_song_words(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_min_delay_ms: default_retry_min_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            lyrics_max_rounds: default_lyrics_max_rounds(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/stanza/config.toml
    /// Reads environment variables with STANZA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("stanza");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Override the store root (the --store-root CLI flag).
    #[must_use]
    pub fn with_store_root(mut self, store_root: PathBuf) -> Self {
        self.store_root = store_root;
        self
    }

    /// Override the bucket (the --bucket CLI flag).
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Override the folder within the bucket (the --folder CLI flag).
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Open the configured bucket folder.
    pub fn open_artifacts(&self) -> stanza_core::Result<Artifacts> {
        let store = open_store(self.store_backend, &self.store_root, &self.bucket)?;
        Ok(Artifacts::new(store, self.folder.clone()))
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            min_delay: Duration::from_millis(self.retry_min_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            max_rounds: self.lyrics_max_rounds,
        }
    }

    /// Built-in gender overrides plus the configured overrides file.
    pub fn gender_overrides(&self) -> stanza_core::Result<GenderOverrides> {
        GenderOverrides::with_file(self.gender_overrides_path.as_deref())
    }

    #[must_use]
    pub fn corpus_options(&self) -> CorpusOptions {
        CorpusOptions::default().with_max_song_words(self.max_song_words)
    }

    /// HTTP client for the configured chart.
    pub fn chart_client(&self) -> Result<BillboardClient> {
        BillboardClient::new(self.chart_url.clone(), &self.user_agent)
            .context("Failed to create chart client")
    }

    /// HTTP client for the lyrics API.
    ///
    /// # Errors
    ///
    /// Returns an error if no access token is configured.
    pub fn lyrics_client(&self) -> Result<GeniusClient> {
        let token = self.lyrics_access_token.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "lyrics_access_token is not set (config file or STANZA_LYRICS_ACCESS_TOKEN)"
            )
        })?;
        GeniusClient::new(self.lyrics_api_base.clone(), token, &self.user_agent)
            .context("Failed to create lyrics client")
    }
}

fn default_store_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stanza")
}

fn default_bucket() -> String {
    "country".to_string()
}

fn default_folder() -> String {
    "data".to_string()
}

fn default_chart_url() -> String {
    "https://www.billboard.com/charts/country-songs/".to_string()
}

fn default_first_chart_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1959, 1, 1).unwrap_or_default()
}

fn default_user_agent() -> String {
    "stanza/0.1.0 (https://github.com/stanza-corpus/stanza)".to_string()
}

fn default_lyrics_api_base() -> String {
    "https://api.genius.com".to_string()
}

fn default_gender_table() -> String {
    "gendered_artists.csv".to_string()
}

const fn default_max_song_words() -> usize {
    1000
}

const fn default_retry_max_attempts() -> usize {
    5
}

const fn default_retry_min_delay_ms() -> u64 {
    500
}

const fn default_retry_max_delay_ms() -> u64 {
    60_000
}

const fn default_lyrics_max_rounds() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/stanza/config.toml
/// - macOS: ~/Library/Application Support/stanza/config.toml
/// - Windows: %APPDATA%\stanza\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stanza")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Stanza Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (STANZA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Where artifacts are stored: "fs" (one file per dataset) or "sqlite"
#store_backend = "fs"
#store_root = "/path/to/stanza-data"
#bucket = "country"
#folder = "data"

# Chart page to scrape; the chart date (YYYY-MM-DD) is appended
#chart_url = "https://www.billboard.com/charts/country-songs/"
#first_chart_date = "1959-01-01"

# Lyrics API access token
#
# Can also be set via:
# - Environment: STANZA_LYRICS_ACCESS_TOKEN=your-token-here
lyrics_access_token = "your-lyrics-api-token-here"

# Manually tagged artist genders (columns: artist_strip,gender), stored
# next to the other datasets in the bucket folder
#gender_table = "gendered_artists.csv"

# TOML file with an [overrides] table (artist = "tag") correcting the
# gender table
#gender_overrides_path = "/path/to/overrides.toml"

# Songs with this many words or more are treated as mis-pulls
#max_song_words = 1000

# Lyrics retry policy
#retry_max_attempts = 5
#retry_min_delay_ms = 500
#retry_max_delay_ms = 60000
#lyrics_max_rounds = 10

#log_level = "info"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.store_root.as_os_str().is_empty());
        assert_eq!(config.store_backend, StoreBackend::Fs);
        assert_eq!(config.max_song_words, 1000);
        assert!(config.lyrics_access_token.is_none());
        assert_eq!(
            config.first_chart_date,
            NaiveDate::from_ymd_opt(1959, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_store_root(PathBuf::from("/tmp/stanza-test"))
            .with_bucket("pop");
        assert_eq!(config.store_root, PathBuf::from("/tmp/stanza-test"));
        assert_eq!(config.bucket, "pop");
    }

    #[test]
    fn test_example_config_parses() {
        let parsed: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(
            parsed.lyrics_access_token.as_deref(),
            Some("your-lyrics-api-token-here")
        );
        assert_eq!(parsed.folder, "data");
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.min_delay, Duration::from_millis(500));
        assert_eq!(policy.max_rounds, 10);
    }

    #[test]
    fn test_lyrics_client_requires_token() {
        assert!(Config::default().lyrics_client().is_err());

        let mut config = Config::default();
        config.lyrics_access_token = Some("token".to_string());
        assert!(config.lyrics_client().is_ok());
    }

    #[test]
    fn test_corpus_options_follow_word_limit() {
        let mut config = Config::default();
        config.max_song_words = 250;
        let options = config.corpus_options();
        assert_eq!(options.max_song_words, 250);
        assert_eq!(options.steps.len(), 3);
    }

    #[test]
    fn test_gender_overrides_without_file() {
        let overrides = Config::default().gender_overrides().unwrap();
        assert_eq!(overrides, GenderOverrides::builtin());
    }

    #[test]
    fn test_open_artifacts_creates_bucket() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::default().with_store_root(dir.path().to_path_buf());
        let artifacts = config.open_artifacts().unwrap();
        assert_eq!(artifacts.folder(), "data");
        assert!(dir.path().join("country").is_dir());
    }
}
