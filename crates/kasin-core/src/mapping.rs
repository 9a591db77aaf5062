//! The line-oriented mapping store that threads state between stages
//!
//! One entry per line, `path,old_id[,new_id]`. A missing third field means
//! "not yet looked up"; an empty third field means "looked up, no Kindle
//! edition"; a non-empty third field is a verified Kindle ASIN. The file is
//! the pipeline's sole coordination artifact, so parsing is lenient
//! (malformed lines are logged and dropped) and writes are atomic.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use kasin_identifiers::is_valid_asin;
use tracing::warn;

use crate::error::{MalformedLine, MappingError};

/// Lookup state of a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not yet looked up
    Pending,
    /// Looked up; the catalog has no Kindle edition for this work
    NoneFound,
    /// Verified Kindle-edition ASIN
    Confirmed(String),
}

impl Resolution {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Resolution::Confirmed(_))
    }

    /// The confirmed identifier, if any.
    pub fn confirmed(&self) -> Option<&str> {
        match self {
            Resolution::Confirmed(id) => Some(id),
            _ => None,
        }
    }
}

/// One library item: a metadata file path, the identifier currently
/// recorded there (possibly empty), and the lookup state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub path: String,
    pub old_id: String,
    pub resolution: Resolution,
}

impl MappingEntry {
    pub fn pending(path: impl Into<String>, old_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_id: old_id.into(),
            resolution: Resolution::Pending,
        }
    }

    // Duplicate-path merges keep the most informationally complete entry:
    // a confirmed identifier beats everything, then a non-empty old
    // identifier, then a recorded negative result.
    fn completeness(&self) -> (bool, bool, bool) {
        (
            self.resolution.is_confirmed(),
            !self.old_id.is_empty(),
            matches!(self.resolution, Resolution::NoneFound),
        )
    }
}

/// Parse one mapping line.
///
/// Shapes that cannot be represented are rejected rather than guessed at:
/// a line without a comma, more than three fields (commas in paths are
/// unsupported), an empty path, or a non-empty third field that is not a
/// syntactically valid ASIN.
pub fn parse_line(line: &str) -> Result<MappingEntry, MalformedLine> {
    let fields: Vec<&str> = line.split(',').collect();
    let entry = match fields.as_slice() {
        [path, old_id] => MappingEntry {
            path: path.trim().to_string(),
            old_id: old_id.trim().to_string(),
            resolution: Resolution::Pending,
        },
        [path, old_id, new_id] => {
            let new_id = new_id.trim();
            let resolution = if new_id.is_empty() {
                Resolution::NoneFound
            } else if is_valid_asin(new_id) {
                Resolution::Confirmed(new_id.to_string())
            } else {
                return Err(MalformedLine::new(format!(
                    "'{new_id}' is not a valid Kindle ASIN"
                )));
            };
            MappingEntry {
                path: path.trim().to_string(),
                old_id: old_id.trim().to_string(),
                resolution,
            }
        }
        [_] => {
            return Err(MalformedLine::new(
                "expected at least two comma-separated fields",
            ))
        }
        _ => {
            return Err(MalformedLine::new(
                "too many fields (commas in paths are unsupported)",
            ))
        }
    };

    if entry.path.is_empty() {
        return Err(MalformedLine::new("empty path"));
    }
    Ok(entry)
}

/// Insertion-ordered set of mapping entries, unique by path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingSet {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> impl Iterator<Item = MappingEntry> {
        self.entries.into_iter()
    }

    pub fn get(&self, path: &str) -> Option<&MappingEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Insert an entry, merging with any existing entry for the same path.
    /// The incoming entry replaces the existing one (keeping its position)
    /// only when it is strictly more complete.
    pub fn insert(&mut self, entry: MappingEntry) {
        match self.index.get(&entry.path) {
            Some(&i) => {
                if entry.completeness() > self.entries[i].completeness() {
                    self.entries[i] = entry;
                }
            }
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Merge every entry of `incoming` into this set.
    pub fn merge(&mut self, incoming: MappingSet) {
        for entry in incoming.entries {
            self.insert(entry);
        }
    }

    /// Update the resolution of the entry at `path`, if present.
    pub fn set_resolution(&mut self, path: &str, resolution: Resolution) {
        if let Some(&i) = self.index.get(path) {
            self.entries[i].resolution = resolution;
        }
    }

    /// Parse mapping text. Malformed lines are logged and dropped; blank
    /// lines are ignored.
    pub fn parse(text: &str) -> Self {
        let mut set = Self::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok(entry) => set.insert(entry),
                Err(err) => warn!(line = idx + 1, %err, "skipping malformed mapping line"),
            }
        }
        set
    }

    /// Serialize to mapping text, one entry per line in insertion order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match &entry.resolution {
                Resolution::Pending => {
                    out.push_str(&format!("{},{}\n", entry.path, entry.old_id))
                }
                Resolution::NoneFound => {
                    out.push_str(&format!("{},{},\n", entry.path, entry.old_id))
                }
                Resolution::Confirmed(id) => {
                    out.push_str(&format!("{},{},{}\n", entry.path, entry.old_id, id))
                }
            }
        }
        out
    }

    /// Load a mapping file. A missing file is an error; callers that treat
    /// absence as an empty set check existence first.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let text = fs::read_to_string(path).map_err(|e| MappingError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    /// Write the mapping file atomically (temp file, then rename into
    /// place) so an interrupt never leaves a truncated file.
    pub fn save(&self, path: &Path) -> Result<(), MappingError> {
        let unwritable = |reason: String| MappingError::Unwritable {
            path: path.to_path_buf(),
            reason,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| unwritable(e.to_string()))?;
        tmp.write_all(self.serialize().as_bytes())
            .map_err(|e| unwritable(e.to_string()))?;
        tmp.persist(path).map_err(|e| unwritable(e.to_string()))?;
        Ok(())
    }
}
