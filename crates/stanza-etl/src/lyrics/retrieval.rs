//! Incremental, restartable lyrics retrieval.
//!
//! The lyrics table is the only dataset that grows across runs. Each round
//! re-reads it from the store, fetches the songs still missing, and writes
//! the whole table back after every song, so an interrupted run loses at
//! most the song in flight.

use std::collections::HashSet;

use backon::Retryable;
use serde::Serialize;

use stanza_core::model::{LibraryRecord, Lyrics, LyricsRecord, SongId};
use stanza_core::store::{Artifacts, Dataset};

use crate::error::{FetchError, FetchResult};
use crate::lyrics::resilience::RetryPolicy;
use crate::lyrics::{fetch_lyrics, LyricsApi};

/// Outcome of a retrieval run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalReport {
    /// Rounds started.
    pub rounds: usize,
    /// Songs stored with lyrics during this run.
    pub fetched: usize,
    /// Songs stored with the not-found sentinel during this run.
    pub not_found: usize,
    /// Fetch attempts that failed after retries.
    pub failed: usize,
    /// Library songs still absent from the lyrics table.
    pub remaining: usize,
}

/// Grows the lyrics table until it covers the library.
#[derive(Debug)]
pub struct LyricsRetriever<'a> {
    api: &'a dyn LyricsApi,
    artifacts: &'a Artifacts,
    policy: RetryPolicy,
}

impl<'a> LyricsRetriever<'a> {
    #[must_use]
    pub fn new(api: &'a dyn LyricsApi, artifacts: &'a Artifacts, policy: RetryPolicy) -> Self {
        Self {
            api,
            artifacts,
            policy,
        }
    }

    /// Fetch lyrics for every library song not yet in the lyrics table.
    ///
    /// Stops when the table covers the library, when a round stores nothing
    /// new, or after the policy's maximum number of rounds.
    pub async fn run(&self) -> FetchResult<RetrievalReport> {
        let library: Vec<LibraryRecord> = self.artifacts.load(&Dataset::Library)?;
        let mut report = RetrievalReport::default();

        while report.rounds < self.policy.max_rounds {
            let mut table: Vec<LyricsRecord> = self.artifacts.load_or_empty(&Dataset::Lyrics)?;
            let missing = missing_songs(&library, &table);
            if missing.is_empty() {
                break;
            }

            report.rounds += 1;
            log::info!(
                "Lyrics round {}: {} of {} songs missing",
                report.rounds,
                missing.len(),
                library.len()
            );

            let mut stored = 0;
            for song in missing {
                match self.fetch_with_retry(&song.title, &song.artist_strip).await {
                    Ok(lyrics) => {
                        if lyrics.is_found() {
                            report.fetched += 1;
                        } else {
                            log::debug!("No lyrics for {}", song.song_id);
                            report.not_found += 1;
                        }
                        table.push(LyricsRecord::new(song.song_id.clone(), lyrics));
                        self.artifacts.save(&Dataset::Lyrics, &table)?;
                        stored += 1;
                    }
                    Err(e) => {
                        log::warn!("Failed to fetch lyrics for {}: {}", song.song_id, e);
                        report.failed += 1;
                    }
                }
            }

            if stored == 0 {
                log::warn!("Lyrics round {} made no progress, stopping", report.rounds);
                break;
            }
        }

        let table: Vec<LyricsRecord> = self.artifacts.load_or_empty(&Dataset::Lyrics)?;
        report.remaining = missing_songs(&library, &table).len();
        Ok(report)
    }

    async fn fetch_with_retry(&self, title: &str, artist: &str) -> FetchResult<Lyrics> {
        let source = self.api.name();
        (|| fetch_lyrics(self.api, title, artist))
            .retry(self.policy.backoff())
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, delay: std::time::Duration| {
                log::debug!(
                    "Retrying {} for {} - {} in {:?}: {}",
                    source,
                    title,
                    artist,
                    delay,
                    err
                );
            })
            .await
    }
}

/// Library songs without a row in the lyrics table, in library order.
fn missing_songs<'l>(library: &'l [LibraryRecord], table: &[LyricsRecord]) -> Vec<&'l LibraryRecord> {
    let fetched: HashSet<&SongId> = table.iter().map(|r| &r.song_id).collect();
    library
        .iter()
        .filter(|record| !fetched.contains(&record.song_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::testing::FakeLyricsApi;
    use chrono::NaiveDate;
    use stanza_core::model::GenderTag;
    use stanza_core::store::{open_store, StoreBackend};
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(title: &str, artist: &str) -> LibraryRecord {
        let date = NaiveDate::from_ymd_opt(1985, 6, 1).unwrap();
        LibraryRecord {
            song_id: SongId::new(title, artist),
            title: title.to_string(),
            artist_strip: artist.to_string(),
            first_charted: date,
            last_charted: date,
            min_rank: 1,
            year: 1985,
            decade: 1980,
            gender: Some(GenderTag::Male),
        }
    }

    fn setup(dir: &TempDir, library: &[LibraryRecord]) -> Artifacts {
        let store = open_store(StoreBackend::Fs, dir.path(), "test").unwrap();
        let artifacts = Artifacts::new(store, "data");
        artifacts.save(&Dataset::Library, library).unwrap();
        artifacts
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_rounds: 3,
        }
    }

    #[tokio::test]
    async fn test_fetches_every_song_and_records_sentinel() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(
            &dir,
            &[record("highwayman", "the highwaymen"), record("unknown song", "unknown artist")],
        );
        let api = FakeLyricsApi::default().with_song(
            "highwayman",
            "the highwaymen",
            "Highwayman Lyrics\nI was a highwayman",
        );

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(report.rounds, 1);

        let table: Vec<LyricsRecord> = artifacts.load(&Dataset::Lyrics).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].lyrics, Lyrics::Found("I was a highwayman".to_string()));
        assert_eq!(table[1].song_id.as_str(), "unknown song-unknown artist");
        assert_eq!(table[1].lyrics, Lyrics::NotFound);
    }

    #[tokio::test]
    async fn test_resumes_from_persisted_table() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(&dir, &[record("a", "x"), record("b", "y")]);
        artifacts
            .save(
                &Dataset::Lyrics,
                &[LyricsRecord::new(SongId::new("a", "x"), Lyrics::NotFound)],
            )
            .unwrap();
        let api = FakeLyricsApi::default();

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        assert_eq!(api.call_count(), 1);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.remaining, 0);
    }

    #[tokio::test]
    async fn test_complete_table_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(&dir, &[record("a", "x")]);
        artifacts
            .save(
                &Dataset::Lyrics,
                &[LyricsRecord::new(SongId::new("a", "x"), Lyrics::Found("la".into()))],
            )
            .unwrap();
        let api = FakeLyricsApi::default();

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        assert_eq!(api.call_count(), 0);
        assert_eq!(report, RetrievalReport::default());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(&dir, &[record("a", "x")]);
        let api = FakeLyricsApi::default()
            .with_song("a", "x", "A Lyrics\nla la")
            .failing_first(2);

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        assert_eq!(api.call_count(), 3);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(&dir, &[record("a", "x")]);
        let api = FakeLyricsApi::default().failing_first(100);

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        // One round of three attempts, then the round made no progress.
        assert_eq!(api.call_count(), 3);
        assert_eq!(report.rounds, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.remaining, 1);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let dir = TempDir::new().unwrap();
        let artifacts = setup(&dir, &[record("bad", "x"), record("good", "y")]);
        let api = FakeLyricsApi::default()
            .with_broken_title("bad")
            .with_song("good", "y", "Good Lyrics\nfine");

        let report = LyricsRetriever::new(&api, &artifacts, fast_policy())
            .run()
            .await
            .unwrap();

        // Round 1 stores "good"; round 2 only retries "bad" and stops.
        assert_eq!(report.rounds, 2);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.remaining, 1);
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_library_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = open_store(StoreBackend::Fs, dir.path(), "test").unwrap();
        let artifacts = Artifacts::new(store, "data");
        let api = FakeLyricsApi::default();

        let result = LyricsRetriever::new(&api, &artifacts, fast_policy()).run().await;
        assert!(matches!(result, Err(FetchError::Store(_))));
    }
}
