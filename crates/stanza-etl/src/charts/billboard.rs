//! Billboard chart page scraper.
//!
//! The chart pages carry no machine-readable listing, so rows are read
//! positionally out of the HTML: each row container holds the title in its
//! first `<h3>` and the artist in its second `<span>`. Any change to that
//! layout is reported as [`FetchError::Layout`] rather than guessed around.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use stanza_core::model::{ChartRow, ChartSnapshot};

use crate::charts::ChartSource;
use crate::error::{FetchError, FetchResult};
use crate::html::text_of;

const SOURCE_NAME: &str = "Billboard";

const MAIN_WRAPPER: &str = "id=\"main-wrapper\"";

static ROW_CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div\b[^>]*\bclass="(?:[^"]*\s)?o-chart-results-list-row-container(?:\s[^"]*)?""#)
        .expect("row container pattern is valid")
});

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h3\b[^>]*>(.*?)</h3>").expect("heading pattern is valid"));

static SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<span\b[^>]*>(.*?)</span>").expect("span pattern is valid"));

/// HTTP client for the weekly chart pages.
#[derive(Debug, Clone)]
pub struct BillboardClient {
    http: Client,
    chart_url: String,
}

impl BillboardClient {
    /// Create a client for a chart; the date is appended to `chart_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(chart_url: impl Into<String>, user_agent: &str) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            chart_url: chart_url.into(),
        })
    }

    #[must_use]
    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}{}", self.chart_url, date)
    }
}

#[async_trait]
impl ChartSource for BillboardClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, date: NaiveDate) -> FetchResult<ChartSnapshot> {
        let url = self.url_for(date);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(SOURCE_NAME, status, url));
        }

        let html = response.text().await?;
        let rows = parse_chart(&html, date, &url)?;
        Ok(ChartSnapshot::new(date, rows))
    }
}

/// Read the ranked rows out of a chart page.
///
/// Rank is the 1-based position of the row container on the page.
///
/// # Errors
/// Returns [`FetchError::Layout`] when the main wrapper, the row containers,
/// or a row's title or artist element is missing.
pub fn parse_chart(html: &str, date: NaiveDate, url: &str) -> FetchResult<Vec<ChartRow>> {
    let layout = |message: String| FetchError::Layout {
        url: url.to_string(),
        message,
    };

    let start = html
        .find(MAIN_WRAPPER)
        .ok_or_else(|| layout("missing main-wrapper container".to_string()))?;
    let body = &html[start..];

    let starts: Vec<usize> = ROW_CONTAINER.find_iter(body).map(|m| m.start()).collect();
    if starts.is_empty() {
        return Err(layout("no chart row containers".to_string()));
    }

    let mut rows = Vec::with_capacity(starts.len());
    for (index, &row_start) in starts.iter().enumerate() {
        let row_end = starts.get(index + 1).copied().unwrap_or(body.len());
        let row = &body[row_start..row_end];
        let rank = u32::try_from(index + 1).map_err(|e| layout(e.to_string()))?;

        let title = HEADING
            .captures(row)
            .and_then(|caps| caps.get(1))
            .map(|m| text_of(m.as_str()))
            .ok_or_else(|| layout(format!("row {rank} has no title heading")))?;

        let artist = SPAN
            .captures_iter(row)
            .nth(1)
            .and_then(|caps| caps.get(1))
            .map(|m| text_of(m.as_str()))
            .ok_or_else(|| layout(format!("row {rank} has no artist span")))?;

        rows.push(ChartRow {
            title,
            artist,
            rank,
            date,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1994, 5, 7).unwrap()
    }

    fn row(title: &str, artist: &str) -> String {
        format!(
            r#"<div class="o-chart-results-list-row-container">
                <ul class="o-chart-results-list-row">
                  <li><span class="c-label rank">1</span></li>
                  <li><h3 id="title-of-a-story" class="c-title">
                        {title}
                  </h3>
                  <span class="c-label a-no-trucate">
                        {artist}
                  </span></li>
                </ul>
              </div>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><div id="main-wrapper"><main>{}</main></div></body></html>"#,
            rows.concat()
        )
    }

    #[test]
    fn test_parse_chart_reads_rows_in_rank_order() {
        let html = page(&[
            row("Wink", "Neal McCoy"),
            row("Whisper My Name", "Randy Travis"),
            row("Rock &amp; Roll Cowboy", "Brooks &amp; Dunn"),
        ]);
        let rows = parse_chart(&html, chart_date(), "u").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "Wink");
        assert_eq!(rows[0].artist, "Neal McCoy");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].title, "Rock & Roll Cowboy");
        assert_eq!(rows[2].artist, "Brooks & Dunn");
        assert_eq!(rows[2].rank, 3);
        assert!(rows.iter().all(|r| r.date == chart_date()));
    }

    #[test]
    fn test_parse_chart_without_main_wrapper_is_layout_error() {
        let html = format!("<html><body>{}</body></html>", row("Wink", "Neal McCoy"));
        let err = parse_chart(&html, chart_date(), "u").unwrap_err();
        assert!(matches!(err, FetchError::Layout { .. }));
    }

    #[test]
    fn test_parse_chart_without_rows_is_layout_error() {
        let err = parse_chart(&page(&[]), chart_date(), "u").unwrap_err();
        assert!(err.to_string().contains("no chart row containers"));
    }

    #[test]
    fn test_parse_chart_row_without_artist_is_layout_error() {
        let broken = r#"<div class="o-chart-results-list-row-container"><h3>Wink</h3><span>1</span></div>"#;
        let html = page(&[row("Wink", "Neal McCoy"), broken.to_string()]);
        let err = parse_chart(&html, chart_date(), "u").unwrap_err();
        assert!(err.to_string().contains("row 2 has no artist span"));
    }

    #[test]
    fn test_similar_class_names_are_not_rows() {
        let decoy = r#"<div class="o-chart-results-list-row-container-extra"><h3>x</h3></div>"#;
        let html = page(&[decoy.to_string(), row("Wink", "Neal McCoy")]);
        let rows = parse_chart(&html, chart_date(), "u").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_url_for_appends_date() {
        let client = BillboardClient::new("https://example.com/charts/country-songs/", "stanza-test")
            .unwrap();
        assert_eq!(
            client.url_for(chart_date()),
            "https://example.com/charts/country-songs/1994-05-07"
        );
    }
}
