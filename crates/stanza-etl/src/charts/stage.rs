use std::sync::Arc;

use chrono::NaiveDate;
use treadle::{Stage, StageContext, StageOutcome};

use stanza_core::store::Artifacts;

use crate::charts::{aggregate_snapshots, pull_charts, ChartSource};

/// The Charts stage: scrape missing weeks, then rebuild the charts table.
#[derive(Debug)]
pub struct ChartsStage {
    artifacts: Arc<Artifacts>,
    source: Arc<dyn ChartSource>,
    first_date: NaiveDate,
    today: Option<NaiveDate>,
}

impl ChartsStage {
    #[must_use]
    pub fn new(artifacts: Arc<Artifacts>, source: Arc<dyn ChartSource>, first_date: NaiveDate) -> Self {
        Self {
            artifacts,
            source,
            first_date,
            today: None,
        }
    }

    /// Pin the scrape's notion of today instead of reading the clock.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

#[async_trait::async_trait]
impl Stage for ChartsStage {
    fn name(&self) -> &str {
        "charts"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let pulled = pull_charts(self.source.as_ref(), &self.artifacts, today, self.first_date)
            .await
            .map_err(|e| {
                treadle::TreadleError::StageExecution(format!("Failed to pull charts: {e}"))
            })?;

        let entries = aggregate_snapshots(&self.artifacts).map_err(|e| {
            treadle::TreadleError::StageExecution(format!("Failed to aggregate charts: {e}"))
        })?;

        log::info!(
            "Charts complete: {} weeks pulled, {} rows aggregated",
            pulled,
            entries.len()
        );

        ctx.metadata
            .insert("weeks_pulled".to_string(), serde_json::json!(pulled));
        ctx.metadata
            .insert("chart_rows".to_string(), serde_json::json!(entries.len()));

        Ok(StageOutcome::Complete)
    }
}
