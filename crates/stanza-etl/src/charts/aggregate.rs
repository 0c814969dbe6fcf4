use stanza_core::model::{ChartEntry, ChartRow};
use stanza_core::store::{Artifacts, Dataset};
use stanza_core::Result;

/// Normalize scraped rows into chart entries, keeping their order.
#[must_use]
pub fn aggregate(rows: impl IntoIterator<Item = ChartRow>) -> Vec<ChartEntry> {
    rows.into_iter().map(ChartEntry::from_row).collect()
}

/// Fold every stored weekly snapshot into the charts table and persist it.
///
/// Snapshots are read oldest first, so the table is chronological.
///
/// # Errors
/// Returns an error if a snapshot cannot be read or the table cannot be
/// written.
pub fn aggregate_snapshots(artifacts: &Artifacts) -> Result<Vec<ChartEntry>> {
    let dates = artifacts.snapshot_dates()?;
    let mut rows: Vec<ChartRow> = Vec::new();
    for date in &dates {
        rows.extend(artifacts.load::<ChartRow>(&Dataset::ChartSnapshot(*date))?);
    }

    let entries = aggregate(rows);
    artifacts.save(&Dataset::Charts, &entries)?;
    log::info!(
        "Aggregated {} chart rows from {} weekly snapshots",
        entries.len(),
        dates.len()
    );
    Ok(entries)
}
