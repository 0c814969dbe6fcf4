//! Minimal HTML text helpers shared by the page scrapers.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Drop every tag, keeping the text between them.
pub(crate) fn strip_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").into_owned()
}

/// Decode the handful of entities that appear in chart and song pages.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Visible text of a fragment: tags dropped, entities decoded, trimmed.
pub(crate) fn text_of(fragment: &str) -> String {
    decode_entities(&strip_tags(fragment)).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Rock &amp; Roll &quot;Live&quot;"), "Rock & Roll \"Live\"");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_text_of_strips_nested_markup() {
        assert_eq!(
            text_of("\n\t<span class=\"c\">Brooks <b>&amp;</b> Dunn</span>\n"),
            "Brooks & Dunn"
        );
    }
}
