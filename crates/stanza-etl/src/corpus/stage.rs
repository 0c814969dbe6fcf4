use std::sync::Arc;

use treadle::{Stage, StageContext, StageOutcome};

use stanza_core::store::Artifacts;

use crate::corpus::build::{build_corpus, CorpusOptions};

/// The Corpus stage: merge, prune and collapse the lyrics into every
/// hierarchy level.
#[derive(Debug)]
pub struct CorpusStage {
    artifacts: Arc<Artifacts>,
    options: CorpusOptions,
}

impl CorpusStage {
    #[must_use]
    pub fn new(artifacts: Arc<Artifacts>, options: CorpusOptions) -> Self {
        Self { artifacts, options }
    }
}

#[async_trait::async_trait]
impl Stage for CorpusStage {
    fn name(&self) -> &str {
        "corpus"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        let summary = build_corpus(&self.artifacts, &self.options).map_err(|e| {
            treadle::TreadleError::StageExecution(format!("Failed to build corpus: {e}"))
        })?;

        log::info!(
            "Corpus complete: {} songs, {} after pruning, {} sections, {} lines, {} tokens",
            summary.songs,
            summary.reduced,
            summary.sections,
            summary.lines,
            summary.tokens
        );

        let summary_json = serde_json::to_value(&summary).map_err(|e| {
            treadle::TreadleError::StageExecution(format!("Failed to serialize summary: {e}"))
        })?;
        ctx.metadata.insert("corpus_summary".to_string(), summary_json);

        Ok(StageOutcome::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stanza_core::model::{LibraryRecord, Lyrics, LyricsRecord, SongId};
    use stanza_core::store::{open_store, Dataset, StoreBackend};
    use tempfile::TempDir;

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct TestItem {
        id: String,
    }

    impl treadle::WorkItem for TestItem {
        fn id(&self) -> &str {
            &self.id
        }
    }

    #[tokio::test]
    async fn test_corpus_stage_reports_counts() {
        let dir = TempDir::new().unwrap();
        let store = open_store(StoreBackend::Sqlite, dir.path(), "test").unwrap();
        let artifacts = Arc::new(Artifacts::new(store, "data"));
        let date = NaiveDate::from_ymd_opt(1975, 8, 2).unwrap();
        let song_id = SongId::new("rhinestone cowboy", "glen campbell");
        artifacts
            .save(
                &Dataset::Library,
                &[LibraryRecord {
                    song_id: song_id.clone(),
                    title: "rhinestone cowboy".to_string(),
                    artist_strip: "glen campbell".to_string(),
                    first_charted: date,
                    last_charted: date,
                    min_rank: 1,
                    year: 1975,
                    decade: 1970,
                    gender: None,
                }],
            )
            .unwrap();
        artifacts
            .save(
                &Dataset::Lyrics,
                &[LyricsRecord::new(
                    song_id,
                    Lyrics::Found("Like a rhinestone cowboy".to_string()),
                )],
            )
            .unwrap();

        let stage = CorpusStage::new(Arc::clone(&artifacts), CorpusOptions::default());
        assert_eq!(stage.name(), "corpus");

        let item = TestItem {
            id: "run".to_string(),
        };
        let mut ctx = StageContext::new("corpus".to_string());
        let outcome = stage.execute(&item, &mut ctx).await.unwrap();
        assert_eq!(outcome, StageOutcome::Complete);

        let summary = ctx.metadata.get("corpus_summary").unwrap();
        assert_eq!(summary.get("tokens").and_then(|v| v.as_u64()), Some(4));
        assert!(artifacts.exists(&Dataset::Tokens).unwrap());
    }
}
