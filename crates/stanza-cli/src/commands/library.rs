use anyhow::{Context, Result};
use std::path::PathBuf;
use stanza_core::store::Dataset;
use stanza_etl::library;
use stanza_etl::Config;

/// Build the library tables, optionally importing a gender table first.
pub fn run_library(config: &Config, import_genders: Option<PathBuf>) -> Result<()> {
    let artifacts = config.open_artifacts()?;

    println!("\n📚 Building library\n");

    if let Some(path) = import_genders {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read gender table {}", path.display()))?;
        let lookup = Dataset::GenderLookup(config.gender_table.clone());
        artifacts.put_bytes(&lookup, &bytes)?;
        println!("  ✓ Imported {} as {}", path.display(), artifacts.key(&lookup));
    }

    let overrides = config.gender_overrides()?;
    let summary = library::run_library(&artifacts, &config.gender_table, &overrides)
        .context("Library build failed")?;

    println!("  Songs: {}", summary.songs);
    println!("  With gender: {}", summary.tagged);
    println!("  Top artists: {}", summary.top_artists);
    println!("  Number ones: {}", summary.number_ones);

    if summary.tagged == 0 {
        println!("\n  No songs have a gender tag. Import one with --import-genders");
    }
    Ok(())
}
