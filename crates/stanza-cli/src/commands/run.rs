use anyhow::{Context, Result};
use chrono::NaiveDate;
use stanza_etl::{advance_run, build_pipeline, Config, PipelineRun};

/// Run the full treadle pipeline for the configured bucket folder.
///
/// Stage state lives next to the artifacts, keyed by bucket and folder.
/// After a failure the next invocation retries the failed stage and skips
/// the ones that completed; after a finished run it starts over so new
/// chart weeks are picked up.
pub async fn run_pipeline(config: &Config, today: Option<NaiveDate>, restart: bool) -> Result<()> {
    println!("\n🎵 Stanza Pipeline\n");
    println!("  Store: {}", config.store_root.display());
    println!("  Bucket: {}/{}", config.bucket, config.folder);
    println!();

    let workflow = build_pipeline(config, today).context("Failed to build pipeline")?;

    std::fs::create_dir_all(&config.store_root)
        .context("Failed to create store directory")?;
    let state_path = config
        .store_root
        .join(format!("{}-pipeline.db", config.bucket));
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    let run = PipelineRun::for_folder(&config.bucket, &config.folder);

    let mut events = workflow.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    println!("  ⏳ [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    println!("  ✓ [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  ✗ [{stage}] FAILED: {error}");
                }
                _ => {}
            }
        }
    });

    advance_run(&workflow, &run, &mut store, restart)
        .await
        .context("Pipeline did not finish; run 'stanza run' again to resume")?;

    println!("\n✓ Pipeline finished for {run}");
    println!("\nRun 'stanza status' to see the datasets in the bucket");
    Ok(())
}
