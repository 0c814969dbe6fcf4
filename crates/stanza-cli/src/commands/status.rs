use anyhow::Result;
use stanza_core::store::Dataset;
use stanza_etl::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let artifacts = config.open_artifacts()?;

    println!("\n📊 Stanza Status\n");
    println!("  Store: {} ({:?})", config.store_root.display(), config.store_backend);
    println!("  Bucket: {}/{}", config.bucket, artifacts.folder());

    let weeks = artifacts.snapshot_dates()?;
    match (weeks.first(), weeks.last()) {
        (Some(first), Some(last)) => {
            println!("  Chart weeks: {} ({first} to {last})", weeks.len());
        }
        _ => println!("  Chart weeks: 0"),
    }

    println!();
    let datasets = [
        Dataset::Charts,
        Dataset::GenderLookup(config.gender_table.clone()),
        Dataset::Library,
        Dataset::TopArtistsByDecade,
        Dataset::NumberOnes,
        Dataset::Lyrics,
        Dataset::Corpus,
        Dataset::CorpusReduced,
        Dataset::Sections,
        Dataset::Lines,
        Dataset::Tokens,
    ];
    for dataset in &datasets {
        match artifacts.row_count(dataset)? {
            Some(rows) => println!("  ✓ {:<28} {rows} rows", dataset.file_name()),
            None => println!("  · {:<28} missing", dataset.file_name()),
        }
    }

    if !artifacts.exists(&Dataset::Charts)? {
        println!("\n  Run 'stanza charts' or 'stanza run' to start");
    }
    Ok(())
}
