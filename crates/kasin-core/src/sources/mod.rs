//! External catalog lookup capability
//!
//! The resolver treats the catalog purely as a classified-result source;
//! how a source talks to the outside world (HTTP, a browser session, a
//! canned script) is its own concern.

pub mod amazon;

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use crate::error::LookupError;

/// Everything the resolver knows about an entry, handed to the source.
#[derive(Debug, Clone)]
pub struct LookupQuery {
    /// Identifier currently recorded in the metadata, possibly empty
    pub old_id: String,
    /// Metadata file the entry refers to, for sources that can build a
    /// richer query from it
    pub metadata_path: PathBuf,
}

/// Classified result of one catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Exactly one Kindle-edition identifier
    Found(String),
    /// The catalog has no Kindle edition for this work
    NotFound,
    /// Multiple candidates; needs manual review
    Ambiguous(Vec<String>),
    /// Anti-robot challenge; an operator must clear it before the same
    /// query can be retried
    Blocked,
}

pub trait KindleLookup {
    fn lookup(&mut self, query: &LookupQuery) -> Result<LookupOutcome, LookupError>;
}

/// Test double replaying canned outcomes per metadata path.
///
/// Each path holds a queue of steps so a single entry can be scripted to
/// block first and succeed after clearance. Paths without a script answer
/// `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    steps: HashMap<String, VecDeque<Result<LookupOutcome, LookupError>>>,
    calls: usize,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, path: &str, outcome: LookupOutcome) -> Self {
        self.steps
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(outcome));
        self
    }

    pub fn expect_err(mut self, path: &str, err: LookupError) -> Self {
        self.steps
            .entry(path.to_string())
            .or_default()
            .push_back(Err(err));
        self
    }

    /// Number of lookups issued so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl KindleLookup for ScriptedLookup {
    fn lookup(&mut self, query: &LookupQuery) -> Result<LookupOutcome, LookupError> {
        self.calls += 1;
        let key = query.metadata_path.to_string_lossy().into_owned();
        match self.steps.get_mut(&key).and_then(|queue| queue.pop_front()) {
            Some(step) => step,
            None => Ok(LookupOutcome::NotFound),
        }
    }
}
