//! Lyrics retrieval.
//!
//! A [`LyricsApi`] maps a title and artist to the raw text a lyrics service
//! returns. [`fetch_lyrics`] cleans that text into a [`Lyrics`] value, and
//! [`retrieval::LyricsRetriever`] grows the persisted lyrics table until it
//! covers every song in the library.

pub mod genius;
pub mod resilience;
pub mod retrieval;
pub mod stage;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use stanza_core::model::Lyrics;

use crate::error::FetchResult;

pub use genius::GeniusClient;
pub use resilience::{RateLimiter, RetryPolicy};
pub use retrieval::{LyricsRetriever, RetrievalReport};
pub use stage::LyricsStage;

/// Bracketed annotations such as `[Chorus]` or `[Verse 2: Artist]`.
static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("annotation pattern is valid"));

/// Trailing embed counter appended by the lyrics site, e.g. `12Embed`.
static EMBED_COUNTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+Embed").expect("embed pattern is valid"));

/// A source of raw song lyrics.
#[async_trait]
pub trait LyricsApi: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Search for a song and return its raw lyrics text, or `None` when the
    /// service has no matching song.
    async fn search_song(&self, title: &str, artist: &str) -> FetchResult<Option<String>>;
}

/// Strip annotations and the embed counter, then drop the header line.
#[must_use]
pub fn clean_lyrics(raw: &str) -> String {
    let without_annotations = ANNOTATION.replace_all(raw, "");
    let without_embed = EMBED_COUNTER.replace_all(&without_annotations, "");
    without_embed
        .split('\n')
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch and clean the lyrics for one song.
///
/// A missing song is not an error: it yields [`Lyrics::NotFound`].
pub async fn fetch_lyrics(api: &dyn LyricsApi, title: &str, artist: &str) -> FetchResult<Lyrics> {
    match api.search_song(title, artist).await {
        Ok(Some(raw)) => Ok(Lyrics::Found(clean_lyrics(&raw))),
        Ok(None) => Ok(Lyrics::NotFound),
        Err(e) if e.is_not_found() => Ok(Lyrics::NotFound),
        Err(e) => Err(e),
    }
}
