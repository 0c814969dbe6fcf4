use anyhow::{Context, Result};
use stanza_etl::lyrics::LyricsRetriever;
use stanza_etl::Config;

pub async fn run_lyrics(config: &Config) -> Result<()> {
    let artifacts = config.open_artifacts()?;
    let client = config.lyrics_client()?;

    println!("\n🎤 Fetching lyrics\n");

    let report = LyricsRetriever::new(&client, &artifacts, config.retry_policy())
        .run()
        .await
        .context("Lyrics retrieval failed")?;

    println!("  Rounds: {}", report.rounds);
    println!("  Fetched: {}", report.fetched);
    println!("  Not found: {}", report.not_found);
    println!("  Failed: {}", report.failed);

    if report.remaining > 0 {
        println!(
            "\n  {} songs still have no lyrics. Run 'stanza lyrics' again to resume",
            report.remaining
        );
    } else {
        println!("\n✓ Every library song has a lyrics row");
    }
    Ok(())
}
