use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

/// One run of the corpus pipeline over a bucket folder.
///
/// This is the treadle `WorkItem` that flows through the charts → library
/// → lyrics → corpus stages. Its id keys the stage state, so reusing the id
/// of an interrupted run resumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    id: String,
    pub bucket: String,
    pub folder: String,
}

impl PipelineRun {
    #[must_use]
    pub fn new(id: impl Into<String>, bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bucket: bucket.into(),
            folder: folder.into(),
        }
    }

    /// The run for a bucket folder, identified by the pair itself.
    #[must_use]
    pub fn for_folder(bucket: &str, folder: &str) -> Self {
        Self::new(format!("{bucket}/{folder}"), bucket, folder)
    }
}

impl WorkItem for PipelineRun {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for PipelineRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_run_creation() {
        let run = PipelineRun::new("run-1", "country", "data");
        assert_eq!(run.id(), "run-1");
        assert_eq!(run.bucket, "country");
        assert_eq!(run.folder, "data");
    }

    #[test]
    fn test_pipeline_run_for_folder_is_stable() {
        let a = PipelineRun::for_folder("pop", "data");
        let b = PipelineRun::for_folder("pop", "data");
        assert_eq!(a.id(), b.id());
        assert_eq!(format!("{a}"), "pop/data");
    }
}
