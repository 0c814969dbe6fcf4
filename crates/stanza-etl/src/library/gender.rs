//! Artist gender lookup.
//!
//! Gender tags come from a manually tagged table that lives in the bucket
//! next to the generated datasets. A small override list corrects artists
//! that were tagged inconsistently; more overrides can be loaded from a
//! TOML file:
//!
//! ```toml
//! [overrides]
//! "the judds" = "d"
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use stanza_core::model::{GenderAssignment, GenderTag};
use stanza_core::{Error, Result};

/// Corrections applied to the tagged table before it is joined.
const BUILTIN_OVERRIDES: [(&str, GenderTag); 5] = [
    ("rascal flatts", GenderTag::Male),
    ("gloriana", GenderTag::Female),
    ("highway 101", GenderTag::Female),
    ("robin lee", GenderTag::Female),
    ("the kendalls", GenderTag::Mixed),
];

/// Per-artist gender corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenderOverrides {
    #[serde(default)]
    overrides: BTreeMap<String, GenderTag>,
}

impl GenderOverrides {
    /// The built-in corrections.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            overrides: BUILTIN_OVERRIDES
                .into_iter()
                .map(|(artist, tag)| (artist.to_string(), tag))
                .collect(),
        }
    }

    /// Load overrides from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let loaded: Self = toml::from_str(&content).map_err(|e| {
            Error::InvalidData(format!(
                "failed to parse gender overrides from {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(loaded.normalized())
    }

    /// Built-in corrections, extended by the file at `path` when given.
    /// File entries win over built-in ones.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn with_file(path: Option<&Path>) -> Result<Self> {
        let mut overrides = Self::builtin();
        if let Some(path) = path {
            overrides.overrides.extend(Self::load(path)?.overrides);
        }
        Ok(overrides)
    }

    #[must_use]
    pub fn get(&self, artist: &str) -> Option<&GenderTag> {
        self.overrides.get(artist)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    fn normalized(self) -> Self {
        Self {
            overrides: self
                .overrides
                .into_iter()
                .map(|(artist, tag)| (artist.trim().to_lowercase(), tag))
                .collect(),
        }
    }
}

/// One row of the tagged table as found in the bucket. Untagged artists
/// have an empty gender cell.
#[derive(Debug, Deserialize)]
pub(crate) struct LookupRow {
    artist_strip: String,
    gender: Option<String>,
}

/// Parse the tagged rows, skipping artists that were left untagged.
pub(crate) fn parse_lookup(rows: Vec<LookupRow>) -> Result<Vec<GenderAssignment>> {
    let mut assignments = Vec::with_capacity(rows.len());
    for row in rows {
        match row.gender.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                assignments.push(GenderAssignment::new(row.artist_strip, code.parse()?));
            }
            _ => log::debug!("Artist {:?} has no gender tag", row.artist_strip),
        }
    }
    Ok(assignments)
}

/// Build the artist → gender map.
///
/// Artist names are trimmed and overrides applied before duplicate rows are
/// dropped. The result must be many-to-one: an artist still carrying two
/// different tags is a [`Error::Cardinality`] violation.
///
/// # Errors
/// Returns an error on a cardinality violation.
pub fn resolve_genders(
    assignments: Vec<GenderAssignment>,
    overrides: &GenderOverrides,
) -> Result<HashMap<String, GenderTag>> {
    let mut seen: HashSet<(String, GenderTag)> = HashSet::new();
    let mut resolved: HashMap<String, GenderTag> = HashMap::new();

    for assignment in assignments {
        let artist = assignment.artist_strip.trim().to_string();
        let gender = overrides
            .get(&artist)
            .cloned()
            .unwrap_or(assignment.gender);

        if !seen.insert((artist.clone(), gender.clone())) {
            continue;
        }
        if resolved.insert(artist.clone(), gender).is_some() {
            let count = seen.iter().filter(|(a, _)| *a == artist).count();
            return Err(Error::Cardinality {
                join: "artist gender",
                key: artist,
                count,
            });
        }
    }

    Ok(resolved)
}
