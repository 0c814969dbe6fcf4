//! The ordered hierarchy of content objects used to index the corpus.
//!
//! Keys run decade → year → gender → artist → title → section → line →
//! token. A [`HierarchyTable`] is indexed by a prefix of that sequence and
//! carries one or more text columns per row.

use std::fmt;

use crate::error::{Error, Result};

pub const SECTION_BREAK: &str = "<s>";
pub const LINE_BREAK: &str = "<l>";
pub const EMBED_MARK: &str = "<e>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Decade,
    Year,
    Gender,
    Artist,
    Title,
    Section,
    Line,
    Token,
}

impl Level {
    /// All levels, outermost first.
    pub const ORDER: [Self; 8] = [
        Self::Decade,
        Self::Year,
        Self::Gender,
        Self::Artist,
        Self::Title,
        Self::Section,
        Self::Line,
        Self::Token,
    ];

    /// Column name used when the level is persisted.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Decade => "decade",
            Self::Year => "year",
            Self::Gender => "gender",
            Self::Artist => "artist_strip",
            Self::Title => "title",
            Self::Section => "section",
            Self::Line => "line",
            Self::Token => "token",
        }
    }

    /// 1-based position in [`Level::ORDER`].
    #[must_use]
    pub const fn depth(self) -> usize {
        self as usize + 1
    }

    /// Delimiter that splits the parent's text into rows of this level.
    ///
    /// Only the levels produced by collapsing text have one.
    #[must_use]
    pub const fn delimiter(self) -> Option<&'static str> {
        match self {
            Self::Section => Some(SECTION_BREAK),
            Self::Line => Some(LINE_BREAK),
            Self::Token => Some(" "),
            _ => None,
        }
    }

    /// The first `depth` levels.
    pub fn prefix(depth: usize) -> Result<&'static [Self]> {
        if depth == 0 || depth > Self::ORDER.len() {
            return Err(Error::InvalidData(format!(
                "hierarchy depth must be between 1 and {}, got {depth}",
                Self::ORDER.len()
            )));
        }
        Ok(&Self::ORDER[..depth])
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyRow {
    pub keys: Vec<String>,
    pub values: Vec<String>,
}

/// A table indexed by the first `depth` hierarchy levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyTable {
    depth: usize,
    columns: Vec<String>,
    rows: Vec<HierarchyRow>,
}

impl HierarchyTable {
    pub fn new(depth: usize, columns: Vec<String>) -> Result<Self> {
        Level::prefix(depth)?;
        if columns.is_empty() {
            return Err(Error::InvalidData(
                "hierarchy table needs at least one content column".to_string(),
            ));
        }
        Ok(Self {
            depth,
            columns,
            rows: Vec::new(),
        })
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn levels(&self) -> &'static [Level] {
        &Level::ORDER[..self.depth]
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[HierarchyRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::NotFound {
                entity: "column",
                id: name.to_string(),
            })
    }

    /// Append a row, checking its key and value arity.
    pub fn push(&mut self, keys: Vec<String>, values: Vec<String>) -> Result<()> {
        if keys.len() != self.depth || values.len() != self.columns.len() {
            return Err(Error::InvalidData(format!(
                "row has {} keys and {} values, table expects {} and {}",
                keys.len(),
                values.len(),
                self.depth,
                self.columns.len()
            )));
        }
        self.rows.push(HierarchyRow { keys, values });
        Ok(())
    }

    /// Keep only rows for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&HierarchyRow) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Encode as CSV: level names, then content columns.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let header = self
            .levels()
            .iter()
            .map(|l| l.name())
            .chain(self.columns.iter().map(String::as_str));
        writer.write_record(header)?;
        for row in &self.rows {
            writer.write_record(row.keys.iter().chain(row.values.iter()))?;
        }
        writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }

    /// Decode a table written by [`HierarchyTable::to_csv`].
    ///
    /// The leading header fields must spell out the first `depth` levels.
    pub fn from_csv(bytes: &[u8], depth: usize) -> Result<Self> {
        let levels = Level::prefix(depth)?;
        let mut reader = csv::Reader::from_reader(bytes);
        let header = reader.headers()?.clone();
        if header.len() <= depth {
            return Err(Error::InvalidData(format!(
                "expected {depth} key columns plus content, found {} columns",
                header.len()
            )));
        }
        for (level, field) in levels.iter().zip(header.iter()) {
            if level.name() != field {
                return Err(Error::InvalidData(format!(
                    "expected key column {}, found {field}",
                    level.name()
                )));
            }
        }

        let columns = header.iter().skip(depth).map(str::to_string).collect();
        let mut table = Self::new(depth, columns)?;
        for record in reader.records() {
            let record = record?;
            let keys = record.iter().take(depth).map(str::to_string).collect();
            let values = record.iter().skip(depth).map(str::to_string).collect();
            table.push(keys, values)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_table() -> HierarchyTable {
        let mut table = HierarchyTable::new(5, vec!["lyrics".to_string()]).unwrap();
        table
            .push(
                vec![
                    "1990".into(),
                    "1994".into(),
                    "m".into(),
                    "alan jackson".into(),
                    "chattahoochee".into(),
                ],
                vec!["way down yonder\non the chattahoochee".into()],
            )
            .unwrap();
        table
    }

    #[test]
    fn test_level_order_and_depth() {
        assert_eq!(Level::Decade.depth(), 1);
        assert_eq!(Level::Title.depth(), 5);
        assert_eq!(Level::Token.depth(), 8);
        assert_eq!(Level::ORDER[Level::Line.depth() - 1], Level::Line);
    }

    #[test]
    fn test_level_delimiters() {
        assert_eq!(Level::Section.delimiter(), Some("<s>"));
        assert_eq!(Level::Line.delimiter(), Some("<l>"));
        assert_eq!(Level::Token.delimiter(), Some(" "));
        assert_eq!(Level::Title.delimiter(), None);
    }

    #[test]
    fn test_prefix_bounds() {
        assert!(Level::prefix(0).is_err());
        assert!(Level::prefix(9).is_err());
        assert_eq!(Level::prefix(2).unwrap(), &[Level::Decade, Level::Year]);
    }

    #[test]
    fn test_push_rejects_wrong_arity() {
        let mut table = HierarchyTable::new(2, vec!["text".to_string()]).unwrap();
        assert!(table.push(vec!["1990".into()], vec!["x".into()]).is_err());
        assert!(table
            .push(vec!["1990".into(), "1994".into()], vec![])
            .is_err());
    }

    #[test]
    fn test_csv_preserves_multiline_content() {
        let table = song_table();
        let bytes = table.to_csv().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("decade,year,gender,artist_strip,title,lyrics"));

        let decoded = HierarchyTable::from_csv(&bytes, 5).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_from_csv_rejects_mismatched_keys() {
        let bytes = b"decade,gender,lyrics\n1990,m,x\n";
        assert!(HierarchyTable::from_csv(bytes, 2).is_err());
    }

    #[test]
    fn test_column_index() {
        let table = song_table();
        assert_eq!(table.column_index("lyrics").unwrap(), 0);
        assert!(table.column_index("prepped").is_err());
    }
}
