use std::sync::Arc;

use chrono::NaiveDate;
use treadle::{PipelineStatus, StageState, StageStatus, StateStore, WorkItem, Workflow};

use stanza_core::store::Artifacts;

use crate::charts::ChartSource;
use crate::lyrics::LyricsApi;
use crate::{ChartsStage, Config, CorpusStage, LibraryStage, LyricsStage, PipelineRun};

/// Build the charts → library → lyrics → corpus pipeline with the
/// production chart scraper and lyrics client.
///
/// `today` pins the newest chart week to scrape; `None` reads the clock
/// when the charts stage runs.
///
/// # Errors
/// Returns an error if the store cannot be opened, a client cannot be
/// created, or the workflow cannot be built.
pub fn build_pipeline(config: &Config, today: Option<NaiveDate>) -> treadle::Result<Workflow> {
    let artifacts = config.open_artifacts().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Failed to open artifact store: {e}"))
    })?;
    let charts = config.chart_client().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Failed to create charts stage: {e:#}"))
    })?;
    let lyrics = config.lyrics_client().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Failed to create lyrics stage: {e:#}"))
    })?;

    build_pipeline_with(
        config,
        Arc::new(artifacts),
        Arc::new(charts),
        Arc::new(lyrics),
        today,
    )
}

/// Build the pipeline over an already opened store and the given sources.
///
/// # Errors
/// Returns an error if the gender overrides cannot be loaded or the
/// workflow cannot be built.
pub fn build_pipeline_with(
    config: &Config,
    artifacts: Arc<Artifacts>,
    charts: Arc<dyn ChartSource>,
    lyrics: Arc<dyn LyricsApi>,
    today: Option<NaiveDate>,
) -> treadle::Result<Workflow> {
    let overrides = config.gender_overrides().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Failed to load gender overrides: {e}"))
    })?;

    let mut charts_stage =
        ChartsStage::new(Arc::clone(&artifacts), charts, config.first_chart_date);
    if let Some(today) = today {
        charts_stage = charts_stage.with_today(today);
    }
    let library_stage = LibraryStage::new(
        Arc::clone(&artifacts),
        config.gender_table.clone(),
        overrides,
    );
    let lyrics_stage = LyricsStage::new(Arc::clone(&artifacts), lyrics, config.retry_policy());
    let corpus_stage = CorpusStage::new(artifacts, config.corpus_options());

    Workflow::builder()
        .stage("charts", charts_stage)
        .stage("library", library_stage)
        .stage("lyrics", lyrics_stage)
        .stage("corpus", corpus_stage)
        .dependency("library", "charts")
        .dependency("lyrics", "library")
        .dependency("corpus", "lyrics")
        .build()
}

/// How a run picked up the stage state stored for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStart {
    /// No usable state: every stage runs.
    Fresh,
    /// An unfinished run continues; completed stages are skipped.
    Resumed,
}

/// Reset the stored stage state of `run` so the next `advance` has work.
///
/// treadle never re-enters a stage that is complete or failed. A finished
/// run is therefore cleared, so new chart weeks get scraped and every table
/// is rebuilt. In an unfinished run, failed stages go back to pending and
/// stages left in progress by a killed process are cleared, while the
/// completed ones are kept. `restart` clears the run unconditionally.
///
/// # Errors
/// Returns an error if the state store cannot be read or written.
pub async fn prepare_run<S: StateStore>(
    workflow: &Workflow,
    run: &PipelineRun,
    store: &mut S,
    restart: bool,
) -> treadle::Result<RunStart> {
    let id = run.id();
    let states = store.get_all_stage_states(id).await?;

    if states.is_empty() {
        return Ok(RunStart::Fresh);
    }
    if restart || workflow.is_complete(id, &*store).await? {
        store.delete_work_item(id).await?;
        return Ok(RunStart::Fresh);
    }

    for (stage, state) in &states {
        match state.status {
            StageStatus::Failed => {
                log::info!(
                    "Retrying stage {stage} for {run} (last error: {})",
                    state.error.as_deref().unwrap_or("unknown")
                );
                workflow.retry_stage(id, stage, store).await?;
            }
            StageStatus::InProgress => {
                log::warn!("Stage {stage} for {run} was interrupted, running it again");
                store.save_stage_state(id, stage, &StageState::new()).await?;
            }
            _ => {}
        }
    }
    Ok(RunStart::Resumed)
}

/// Prepare `run`, advance it as far as it goes, and report the outcome.
///
/// # Errors
/// Returns an error if the state store fails or if any stage ended the
/// advance in the failed state.
pub async fn advance_run<S: StateStore>(
    workflow: &Workflow,
    run: &PipelineRun,
    store: &mut S,
    restart: bool,
) -> treadle::Result<PipelineStatus> {
    let start = prepare_run(workflow, run, store, restart).await?;
    log::info!("Starting {start:?} pipeline run for {run}");

    workflow.advance(run, store).await?;

    let status = workflow.status(run.id(), &*store).await?;
    if status.has_failures() {
        let failed: Vec<String> = status
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .map(|s| format!("{}: {}", s.name, s.error.as_deref().unwrap_or("unknown error")))
            .collect();
        return Err(treadle::TreadleError::StageExecution(format!(
            "Pipeline for {run} stopped at failed stage(s): {}",
            failed.join("; ")
        )));
    }
    Ok(status)
}
