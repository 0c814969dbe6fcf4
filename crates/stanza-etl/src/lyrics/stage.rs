use std::sync::Arc;

use treadle::{Stage, StageContext, StageOutcome};

use stanza_core::store::Artifacts;

use crate::lyrics::retrieval::LyricsRetriever;
use crate::lyrics::{LyricsApi, RetryPolicy};

/// The Lyrics stage: grow the lyrics table until it covers the library.
///
/// The stage fails while songs are still missing, which keeps the corpus
/// stage from running on partial lyrics. `prepare_run` puts the failed
/// stage back to pending, so the next run resumes retrieval.
#[derive(Debug)]
pub struct LyricsStage {
    artifacts: Arc<Artifacts>,
    api: Arc<dyn LyricsApi>,
    policy: RetryPolicy,
}

impl LyricsStage {
    #[must_use]
    pub fn new(artifacts: Arc<Artifacts>, api: Arc<dyn LyricsApi>, policy: RetryPolicy) -> Self {
        Self {
            artifacts,
            api,
            policy,
        }
    }
}

#[async_trait::async_trait]
impl Stage for LyricsStage {
    fn name(&self) -> &str {
        "lyrics"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Retrieving lyrics from {}", self.api.name());

        let report = LyricsRetriever::new(self.api.as_ref(), &self.artifacts, self.policy.clone())
            .run()
            .await
            .map_err(|e| {
                treadle::TreadleError::StageExecution(format!("Lyrics retrieval failed: {e}"))
            })?;

        log::info!(
            "Lyrics complete: {} fetched, {} not found, {} failed, {} remaining after {} rounds",
            report.fetched,
            report.not_found,
            report.failed,
            report.remaining,
            report.rounds
        );

        let report_json = serde_json::to_value(&report).map_err(|e| {
            treadle::TreadleError::StageExecution(format!("Failed to serialize report: {e}"))
        })?;
        ctx.metadata.insert("lyrics_report".to_string(), report_json);

        if report.remaining > 0 {
            return Err(treadle::TreadleError::StageExecution(format!(
                "{} songs still have no lyrics",
                report.remaining
            )));
        }

        Ok(StageOutcome::Complete)
    }
}
