//! Splitting one hierarchy level into the next.

use stanza_core::model::{HierarchyTable, Level};
use stanza_core::store::Dataset;
use stanza_core::{Error, Result};

use crate::corpus::PREPPED_COLUMN;

/// One collapse from a parent table into the rows of `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseStep {
    /// Level the new rows belong to; its delimiter splits the content.
    pub level: Level,
    /// Content column of the parent table.
    pub content: String,
    /// Content column of the new table.
    pub column: String,
    /// Parent rows splitting into more fragments than this are dropped.
    pub max_fragments: Option<usize>,
}

impl CollapseStep {
    #[must_use]
    pub fn new(level: Level, content: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
            column: column.into(),
            max_fragments: None,
        }
    }

    /// Songs into sections.
    #[must_use]
    pub fn sections() -> Self {
        Self::new(Level::Section, PREPPED_COLUMN, "section_lyrics")
    }

    /// Sections into lines.
    #[must_use]
    pub fn lines() -> Self {
        Self::new(Level::Line, "section_lyrics", "line_lyrics")
    }

    /// Lines into tokens.
    #[must_use]
    pub fn tokens() -> Self {
        Self::new(Level::Token, "line_lyrics", "token")
    }

    #[must_use]
    pub fn with_max_fragments(mut self, limit: usize) -> Self {
        self.max_fragments = Some(limit);
        self
    }

    /// Dataset the parent table is read from.
    pub fn input(&self) -> Result<Dataset> {
        match self.level {
            Level::Section => Ok(Dataset::CorpusReduced),
            Level::Line => Ok(Dataset::Sections),
            Level::Token => Ok(Dataset::Lines),
            other => Err(not_collapsible(other)),
        }
    }

    /// Dataset the collapsed table is written to.
    pub fn output(&self) -> Result<Dataset> {
        match self.level {
            Level::Section => Ok(Dataset::Sections),
            Level::Line => Ok(Dataset::Lines),
            Level::Token => Ok(Dataset::Tokens),
            other => Err(not_collapsible(other)),
        }
    }
}

fn not_collapsible(level: Level) -> Error {
    Error::InvalidData(format!("level {level} is not produced by splitting text"))
}

/// Number of rows `content` collapses into. Empty content has none.
#[must_use]
pub fn fragment_count(content: &str, delimiter: &str) -> usize {
    if content.trim().is_empty() {
        0
    } else {
        content.split(delimiter).count()
    }
}

/// Split each row's content into child rows one level deeper.
///
/// Every fragment gets the parent's keys plus its 0-based position, and is
/// trimmed. Empty fragments between delimiters are kept; content that is
/// empty altogether yields no rows.
///
/// # Errors
/// Returns an error if `table` is not indexed one level above `step.level`,
/// the level has no delimiter, or the content column is missing.
pub fn collapse(table: &HierarchyTable, step: &CollapseStep) -> Result<HierarchyTable> {
    let delimiter = step
        .level
        .delimiter()
        .ok_or_else(|| not_collapsible(step.level))?;
    if table.depth() + 1 != step.level.depth() {
        return Err(Error::InvalidData(format!(
            "cannot collapse a depth {} table into {}",
            table.depth(),
            step.level
        )));
    }
    let content = table.column_index(&step.content)?;

    let mut collapsed = HierarchyTable::new(step.level.depth(), vec![step.column.clone()])?;
    let mut dropped = 0usize;
    for row in table.rows() {
        let text = &row.values[content];
        let count = fragment_count(text, delimiter);
        if count == 0 {
            continue;
        }
        if step.max_fragments.is_some_and(|limit| count > limit) {
            dropped += 1;
            continue;
        }
        for (ordinal, fragment) in text.split(delimiter).enumerate() {
            let mut keys = row.keys.clone();
            keys.push(ordinal.to_string());
            collapsed.push(keys, vec![fragment.trim().to_string()])?;
        }
    }

    if dropped > 0 {
        log::info!(
            "Dropped {} rows with more than {} {} fragments",
            dropped,
            step.max_fragments.unwrap_or_default(),
            step.level
        );
    }
    log::debug!(
        "Collapsed {} rows into {} {} rows",
        table.len(),
        collapsed.len(),
        step.level
    );
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::prep_for_analysis;

    fn song_keys(title: &str) -> Vec<String> {
        vec![
            "1990".to_string(),
            "1992".to_string(),
            "m".to_string(),
            "brooks & dunn".to_string(),
            title.to_string(),
        ]
    }

    fn songs(prepped: &[(&str, &str)]) -> HierarchyTable {
        let mut table = HierarchyTable::new(5, vec![PREPPED_COLUMN.to_string()]).unwrap();
        for (title, text) in prepped {
            table.push(song_keys(title), vec![(*text).to_string()]).unwrap();
        }
        table
    }

    #[test]
    fn test_sections_then_lines() {
        let prepped = prep_for_analysis("verse one line a\nverse one line b<s>chorus line c");
        let table = songs(&[("neon moon", prepped.as_str())]);

        let sections = collapse(&table, &CollapseStep::sections()).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections.columns(), ["section_lyrics".to_string()]);
        assert_eq!(sections.rows()[0].keys[5], "0");
        assert_eq!(sections.rows()[1].keys[5], "1");
        assert_eq!(sections.rows()[1].values[0], "chorus line c");

        let lines = collapse(&sections, &CollapseStep::lines()).unwrap();
        let per_section: Vec<usize> = ["0", "1"]
            .iter()
            .map(|s| lines.rows().iter().filter(|r| r.keys[5] == *s).count())
            .collect();
        assert_eq!(per_section, vec![2, 1]);
        assert_eq!(lines.rows()[1].values[0], "verse one line b");
        assert_eq!(lines.rows()[1].keys[..6], sections.rows()[0].keys[..]);
    }

    #[test]
    fn test_tokens_are_trimmed_fragments() {
        let mut lines = HierarchyTable::new(7, vec!["line_lyrics".to_string()]).unwrap();
        let mut keys = song_keys("neon moon");
        keys.extend(["0".to_string(), "0".to_string()]);
        lines
            .push(keys, vec!["when the sun goes down".to_string()])
            .unwrap();

        let tokens = collapse(&lines, &CollapseStep::tokens()).unwrap();
        let words: Vec<&str> = tokens.rows().iter().map(|r| r.values[0].as_str()).collect();
        assert_eq!(words, vec!["when", "the", "sun", "goes", "down"]);
        assert_eq!(tokens.rows()[4].keys[7], "4");
        assert_eq!(tokens.levels().last(), Some(&Level::Token));
    }

    #[test]
    fn test_row_count_is_sum_of_fragment_counts() {
        let table = songs(&[
            ("a", "one <s> two <s> three"),
            ("b", "solo"),
            ("c", ""),
            ("d", "lead <s> <s> tail"),
        ]);
        let expected: usize = table
            .rows()
            .iter()
            .map(|r| fragment_count(&r.values[0], "<s>"))
            .sum();

        let sections = collapse(&table, &CollapseStep::sections()).unwrap();
        assert_eq!(expected, 7);
        assert_eq!(sections.len(), expected);
        // Empty fragments between delimiters survive as empty rows.
        assert_eq!(sections.rows()[5].values[0], "");
    }

    #[test]
    fn test_empty_content_yields_no_rows() {
        let table = songs(&[("quiet", "   ")]);
        assert!(collapse(&table, &CollapseStep::sections()).unwrap().is_empty());
        assert_eq!(fragment_count("", " "), 0);
    }

    #[test]
    fn test_every_child_has_one_parent() {
        let table = songs(&[("a", "x <s> y"), ("b", "z")]);
        let sections = collapse(&table, &CollapseStep::sections()).unwrap();
        for child in sections.rows() {
            let parents = table
                .rows()
                .iter()
                .filter(|p| p.keys[..] == child.keys[..5])
                .count();
            assert_eq!(parents, 1);
        }
    }

    #[test]
    fn test_fragment_limit_drops_long_rows() {
        let table = songs(&[("long", "a <s> b <s> c"), ("short", "a <s> b")]);
        let step = CollapseStep::sections().with_max_fragments(2);
        let sections = collapse(&table, &step).unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections.rows().iter().all(|r| r.keys[4] == "short"));
    }

    #[test]
    fn test_depth_mismatch_is_rejected() {
        let table = songs(&[("a", "x")]);
        assert!(collapse(&table, &CollapseStep::lines()).is_err());
        let step = CollapseStep::new(Level::Title, PREPPED_COLUMN, "t");
        assert!(collapse(&table, &step).is_err());
    }

    #[test]
    fn test_missing_content_column_is_rejected() {
        let table = songs(&[("a", "x")]);
        let step = CollapseStep::new(Level::Section, "lyrics", "section_lyrics");
        assert!(matches!(
            collapse(&table, &step),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_step_datasets() {
        assert_eq!(CollapseStep::sections().input().unwrap(), Dataset::CorpusReduced);
        assert_eq!(CollapseStep::tokens().output().unwrap(), Dataset::Tokens);
        assert!(CollapseStep::new(Level::Year, "a", "b").output().is_err());
    }
}
