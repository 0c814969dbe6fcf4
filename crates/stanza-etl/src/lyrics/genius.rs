//! Genius lyrics client.
//!
//! Song search goes through the authenticated JSON API; the lyrics
//! themselves are only published on the song page, so the client downloads
//! that page and lifts the text out of its lyrics containers.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{FetchError, FetchResult};
use crate::html::{decode_entities, strip_tags};
use crate::lyrics::resilience::RateLimiter;
use crate::lyrics::LyricsApi;

const SOURCE_NAME: &str = "Genius";

/// Marker attribute on every lyrics block of a song page.
const LYRICS_CONTAINER: &str = "data-lyrics-container=\"true\"";

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern is valid"));

static DIV_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*>").expect("div pattern is valid"));

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "type")]
    hit_type: String,
    result: SongHit,
}

/// A song returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SongHit {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub primary_artist: HitArtist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitArtist {
    pub name: String,
}

/// Genius API client.
#[derive(Debug, Clone)]
pub struct GeniusClient {
    http: Client,
    api_base: String,
    access_token: String,
    rate_limiter: RateLimiter,
}

impl GeniusClient {
    /// Create a new Genius client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        user_agent: &str,
    ) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            rate_limiter: RateLimiter::new(5),
        })
    }

    /// Search for songs matching a free-text query.
    async fn search(&self, query: &str) -> FetchResult<Vec<SongHit>> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(SOURCE_NAME, status, body));
        }

        let envelope: SearchEnvelope = response.json().await.map_err(|e| FetchError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(envelope
            .response
            .hits
            .into_iter()
            .filter(|hit| hit.hit_type == "song")
            .map(|hit| hit.result)
            .collect())
    }

    /// Download a song page.
    async fn song_page(&self, url: &str) -> FetchResult<String> {
        self.rate_limiter.acquire().await;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(SOURCE_NAME, status, url.to_string()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl LyricsApi for GeniusClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search_song(&self, title: &str, artist: &str) -> FetchResult<Option<String>> {
        let hits = self.search(&format!("{title} {artist}")).await?;
        let Some(hit) = pick_hit(&hits, artist) else {
            log::debug!("No Genius match for {} - {}", title, artist);
            return Ok(None);
        };

        log::debug!("Genius match {} for {} - {}", hit.id, title, artist);
        let page = self.song_page(&hit.url).await?;
        Ok(extract_lyrics(&page).map(|body| format!("{} Lyrics\n{}", hit.title, body)))
    }
}

/// The first song hit whose primary artist matches `artist`.
///
/// Names match when either contains the other, ignoring case.
fn pick_hit<'a>(hits: &'a [SongHit], artist: &str) -> Option<&'a SongHit> {
    let wanted = artist.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    hits.iter().find(|hit| {
        let name = hit.primary_artist.name.to_lowercase();
        name.contains(&wanted) || wanted.contains(&name)
    })
}

/// Pull the lyrics text out of a song page.
///
/// Each lyrics container becomes a run of lines; `<br>` becomes a newline
/// and every other tag is dropped. Returns `None` when the page has no
/// lyrics containers.
fn extract_lyrics(html: &str) -> Option<String> {
    let mut blocks = Vec::new();
    let mut rest = html;
    while let Some(marker) = rest.find(LYRICS_CONTAINER) {
        let after_marker = &rest[marker..];
        let open_end = after_marker.find('>')? + 1;
        let body = &after_marker[open_end..];
        let close = matching_div_close(body)?;
        blocks.push(html_to_text(&body[..close]));
        rest = &body[close..];
    }
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

/// Byte offset of the `</div>` closing an already-opened div.
fn matching_div_close(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for caps in DIV_TAG.captures_iter(body) {
        let tag = caps.get(0)?;
        if caps.get(1).is_some_and(|slash| !slash.as_str().is_empty()) {
            depth -= 1;
            if depth == 0 {
                return Some(tag.start());
            }
        } else {
            depth += 1;
        }
    }
    None
}

fn html_to_text(fragment: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(fragment, "\n");
    decode_entities(&strip_tags(&with_breaks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u64, title: &str, artist: &str) -> SongHit {
        SongHit {
            id,
            title: title.to_string(),
            url: format!("https://genius.com/{id}"),
            primary_artist: HitArtist {
                name: artist.to_string(),
            },
        }
    }

    #[test]
    fn test_client_creation() {
        let client = GeniusClient::new("https://api.genius.com/", "token", "stanza-test").unwrap();
        assert_eq!(client.api_base, "https://api.genius.com");
        let debug = format!("{:?}", client);
        assert!(debug.contains("RateLimiter"));
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "meta": {"status": 200},
            "response": {
                "hits": [
                    {"type": "song", "result": {"id": 1, "title": "Jolene", "url": "https://genius.com/Dolly-parton-jolene-lyrics", "primary_artist": {"name": "Dolly Parton"}}},
                    {"type": "album", "result": {"id": 2, "title": "Jolene", "url": "https://genius.com/albums/x", "primary_artist": {"name": "Dolly Parton"}}}
                ]
            }
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response.hits.len(), 2);
        assert_eq!(envelope.response.hits[0].result.primary_artist.name, "Dolly Parton");
    }

    #[test]
    fn test_search_response_without_hits() {
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"response": {}}"#).unwrap();
        assert!(envelope.response.hits.is_empty());
    }

    #[test]
    fn test_pick_hit_matches_artist() {
        let hits = vec![
            hit(1, "Jolene", "Miley Cyrus"),
            hit(2, "Jolene", "Dolly Parton"),
        ];
        assert_eq!(pick_hit(&hits, "dolly parton").map(|h| h.id), Some(2));
        // A longer credit still matches its primary artist.
        assert_eq!(pick_hit(&hits, "Dolly Parton & Porter").map(|h| h.id), Some(2));
        assert_eq!(pick_hit(&hits, "unknown artist").map(|h| h.id), None);
        assert!(pick_hit(&hits, "  ").is_none());
    }

    #[test]
    fn test_extract_lyrics_handles_nested_divs() {
        let html = r#"<html><body>
            <div data-lyrics-container="true" class="Lyrics">[Verse 1]<br/>Jolene, Jolene<div class="ad"><span>x</span></div><br>I&#x27;m begging of you</div>
            <div class="other">not lyrics</div>
            <div data-lyrics-container="true">Please don&#39;t take him<br/>Just because you can</div>
        </body></html>"#;
        let text = extract_lyrics(html).unwrap();
        assert_eq!(
            text,
            "[Verse 1]\nJolene, Jolenex\nI'm begging of you\nPlease don't take him\nJust because you can"
        );
    }

    #[test]
    fn test_extract_lyrics_without_container() {
        assert_eq!(extract_lyrics("<html><div>instrumental</div></html>"), None);
    }
}
