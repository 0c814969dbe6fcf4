//! Weekly chart scraping and aggregation.
//!
//! A [`ChartSource`] returns one week's ranked rows. [`pull_charts`] stores
//! every week that is not in the bucket yet as its own snapshot dataset, so
//! an interrupted scrape picks up where it stopped.
//! [`aggregate::aggregate_snapshots`] then folds all snapshots into the
//! normalized charts table.

pub mod aggregate;
pub mod billboard;
pub mod stage;

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};

use stanza_core::model::ChartSnapshot;
use stanza_core::store::{Artifacts, Dataset};

use crate::error::FetchResult;

pub use aggregate::{aggregate, aggregate_snapshots};
pub use billboard::BillboardClient;
pub use stage::ChartsStage;

/// A source of weekly chart snapshots.
#[async_trait]
pub trait ChartSource: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Fetch the chart published for `date`.
    async fn fetch(&self, date: NaiveDate) -> FetchResult<ChartSnapshot>;
}

/// The Saturday chart date preceding `today`.
#[must_use]
pub fn most_recent_chart_date(today: NaiveDate) -> NaiveDate {
    let back = u64::from(today.weekday().num_days_from_monday()) + 2;
    today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

/// Every weekly chart date from the most recent one back to `first`,
/// newest first. `first` itself is included when it falls on a chart week.
#[must_use]
pub fn chart_dates(today: NaiveDate, first: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = Some(most_recent_chart_date(today));
    while let Some(date) = current.filter(|d| *d >= first) {
        dates.push(date);
        current = date.checked_sub_days(Days::new(7));
    }
    dates
}

/// The dates in `dates` that have no stored snapshot yet.
#[must_use]
pub fn pending_dates(dates: &[NaiveDate], pulled: &[NaiveDate]) -> Vec<NaiveDate> {
    let pulled: HashSet<&NaiveDate> = pulled.iter().collect();
    dates
        .iter()
        .filter(|date| !pulled.contains(date))
        .copied()
        .collect()
}

/// Scrape and store every missing chart week between `first` and `today`.
///
/// Each snapshot is written as soon as it is fetched. Returns the number of
/// snapshots written.
///
/// # Errors
/// Stops at the first fetch or store error; snapshots written before it are
/// kept.
pub async fn pull_charts(
    source: &dyn ChartSource,
    artifacts: &Artifacts,
    today: NaiveDate,
    first: NaiveDate,
) -> FetchResult<usize> {
    let dates = chart_dates(today, first);
    let pending = pending_dates(&dates, &artifacts.snapshot_dates()?);
    log::info!(
        "{} of {} chart weeks to pull from {}",
        pending.len(),
        dates.len(),
        source.name()
    );

    for date in &pending {
        let snapshot = source.fetch(*date).await?;
        log::debug!("Pulled {} rows for {}", snapshot.rows.len(), date);
        artifacts.save(&Dataset::ChartSnapshot(*date), &snapshot.rows)?;
    }

    Ok(pending.len())
}
