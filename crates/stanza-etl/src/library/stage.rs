use std::sync::Arc;

use treadle::{Stage, StageContext, StageOutcome};

use stanza_core::store::Artifacts;

use crate::library::{run_library, GenderOverrides};

/// The Library stage: rebuild per-song metadata from the charts table.
#[derive(Debug)]
pub struct LibraryStage {
    artifacts: Arc<Artifacts>,
    gender_table: String,
    overrides: GenderOverrides,
}

impl LibraryStage {
    #[must_use]
    pub fn new(
        artifacts: Arc<Artifacts>,
        gender_table: impl Into<String>,
        overrides: GenderOverrides,
    ) -> Self {
        Self {
            artifacts,
            gender_table: gender_table.into(),
            overrides,
        }
    }
}

#[async_trait::async_trait]
impl Stage for LibraryStage {
    fn name(&self) -> &str {
        "library"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        ctx: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        let summary = run_library(&self.artifacts, &self.gender_table, &self.overrides)
            .map_err(|e| {
                treadle::TreadleError::StageExecution(format!("Failed to build library: {e}"))
            })?;

        let summary_json = serde_json::to_value(&summary).map_err(|e| {
            treadle::TreadleError::StageExecution(format!("Failed to serialize summary: {e}"))
        })?;
        ctx.metadata
            .insert("library_summary".to_string(), summary_json);

        Ok(StageOutcome::Complete)
    }
}
