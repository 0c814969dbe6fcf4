use anyhow::{Context, Result};
use chrono::NaiveDate;
use stanza_etl::charts::{aggregate_snapshots, pull_charts};
use stanza_etl::Config;

/// Scrape any missing chart weeks, then rebuild the charts table.
pub async fn run_charts(config: &Config, today: Option<NaiveDate>) -> Result<()> {
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let artifacts = config.open_artifacts()?;
    let client = config.chart_client()?;

    println!("\n📈 Pulling charts\n");
    println!("  Chart: {}", config.chart_url);
    println!("  Weeks: {} to {}", config.first_chart_date, today);
    println!();

    let pulled = pull_charts(&client, &artifacts, today, config.first_chart_date)
        .await
        .context("Chart scrape failed")?;
    println!("  ✓ Pulled {pulled} new weeks");

    let entries = aggregate_snapshots(&artifacts).context("Chart aggregation failed")?;
    println!("  ✓ Charts table: {} rows", entries.len());

    println!("\nNext: run 'stanza library' to build the song library");
    Ok(())
}
