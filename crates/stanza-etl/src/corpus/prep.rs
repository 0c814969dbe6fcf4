//! Text normalization applied to lyrics before they are split.

use once_cell::sync::Lazy;
use regex::Regex;

use stanza_core::model::hierarchy::{EMBED_MARK, LINE_BREAK, SECTION_BREAK};

/// Boundary tokens that may already be present in the input.
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<[sle]>").expect("boundary pattern is valid"));

/// Normalize lyrics for analysis.
///
/// Line endings are normalized, ASCII punctuation is removed and the text is
/// lowercased. Blank lines become section breaks (`<s>`), remaining newlines
/// become line breaks (`<l>`), `embed` becomes `<e>`, and runs of whitespace
/// collapse to one space. Boundary tokens already in the input are kept.
#[must_use]
pub fn prep_for_analysis(song: &str) -> String {
    let song = song.replace("\r\n", "\n");
    let mut prepped = String::with_capacity(song.len());
    let mut last = 0;
    for boundary in BOUNDARY.find_iter(&song) {
        prepped.push_str(&prep_segment(&song[last..boundary.start()]));
        prepped.push(' ');
        prepped.push_str(&boundary.as_str().to_lowercase());
        prepped.push(' ');
        last = boundary.end();
    }
    prepped.push_str(&prep_segment(&song[last..]));

    prepped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn prep_segment(segment: &str) -> String {
    let stripped: String = segment
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    stripped
        .to_lowercase()
        .replace("\n\n", &format!(" {SECTION_BREAK} "))
        .replace('\n', &format!(" {LINE_BREAK} "))
        .replace("embed", &format!(" {EMBED_MARK}"))
}
