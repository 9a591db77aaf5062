//! Lookup resolver
//!
//! Walks the mapping set in store order, classifies each catalog result,
//! and persists the set after every change so an interrupt after entry *k*
//! never loses entries 1..k-1. The one designed suspension point is the
//! anti-robot challenge: processing blocks until the operator signals the
//! challenge is cleared, then retries the same entry.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use kasin_identifiers::{is_valid_asin, normalize_asin};
use tracing::{info, warn};

use crate::config::LookupConfig;
use crate::error::{KasinError, LookupError};
use crate::mapping::{MappingSet, Resolution};
use crate::report::ResolveReport;
use crate::sources::{KindleLookup, LookupOutcome, LookupQuery};

/// Blocking operator acknowledgement for anti-robot challenges.
pub trait ChallengePrompt {
    /// Block until the operator signals the challenge is cleared. No
    /// timeout; an operator may take arbitrarily long.
    fn await_clearance(&mut self) -> Result<(), LookupError>;
}

/// Prompt on stdin: prints instructions, waits for Enter. A closed stdin
/// counts as an abort.
pub struct StdinPrompt;

impl ChallengePrompt for StdinPrompt {
    fn await_clearance(&mut self) -> Result<(), LookupError> {
        use std::io::BufRead;

        println!("The catalog returned a robot challenge.");
        println!("Complete it in a browser, then press Enter to continue...");
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => Err(LookupError::Aborted),
            Ok(_) => Ok(()),
        }
    }
}

/// Persists the mapping set after each classification.
pub trait Checkpoint {
    fn save(&mut self, set: &MappingSet) -> Result<(), KasinError>;
}

/// File-backed checkpoint writing through the atomic mapping save.
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Checkpoint for FileCheckpoint {
    fn save(&mut self, set: &MappingSet) -> Result<(), KasinError> {
        set.save(&self.path).map_err(Into::into)
    }
}

pub struct Resolver<L, P> {
    lookup: L,
    prompt: P,
    delay: Duration,
}

impl<L: KindleLookup, P: ChallengePrompt> Resolver<L, P> {
    pub fn new(lookup: L, prompt: P, config: &LookupConfig) -> Self {
        Self {
            lookup,
            prompt,
            delay: config.delay(),
        }
    }

    /// Resolve every entry lacking a confirmed identifier, in store order.
    ///
    /// Per-entry lookup failures leave the entry unchanged and never abort
    /// the batch; only an operator abort during a challenge propagates,
    /// and by then everything already classified has been checkpointed.
    pub fn run(
        &mut self,
        set: &mut MappingSet,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<ResolveReport, KasinError> {
        let pending: Vec<String> = set
            .entries()
            .iter()
            .filter(|entry| !entry.resolution.is_confirmed())
            .map(|entry| entry.path.clone())
            .collect();

        let mut report = ResolveReport {
            attempted: pending.len(),
            ..ResolveReport::default()
        };

        for (i, path) in pending.iter().enumerate() {
            let Some(entry) = set.get(path) else { continue };
            let query = LookupQuery {
                old_id: entry.old_id.clone(),
                metadata_path: PathBuf::from(&entry.path),
            };

            if i > 0 && !self.delay.is_zero() {
                // Sequential, human-observable pacing toward the catalog
                thread::sleep(self.delay);
            }

            match self.lookup_with_clearance(&query) {
                Ok(LookupOutcome::Found(id)) => {
                    let id = normalize_asin(&id);
                    if is_valid_asin(&id) {
                        info!(path = %path, asin = %id, "resolved Kindle edition");
                        set.set_resolution(path, Resolution::Confirmed(id));
                        checkpoint.save(set)?;
                        report.resolved += 1;
                    } else {
                        warn!(path = %path, id = %id, "source returned a malformed identifier");
                        report.failed += 1;
                    }
                }
                Ok(LookupOutcome::NotFound) => {
                    info!(path = %path, "no Kindle edition in the catalog");
                    set.set_resolution(path, Resolution::NoneFound);
                    checkpoint.save(set)?;
                    report.none_found += 1;
                }
                Ok(LookupOutcome::Ambiguous(candidates)) => {
                    info!(
                        path = %path,
                        candidates = candidates.len(),
                        "ambiguous result, left for manual review"
                    );
                    report.ambiguous += 1;
                }
                // lookup_with_clearance never returns Blocked
                Ok(LookupOutcome::Blocked) => {}
                // An operator abort ends the run; everything classified so
                // far is already checkpointed
                Err(LookupError::Aborted) => return Err(LookupError::Aborted.into()),
                Err(err) => {
                    warn!(path = %path, %err, "lookup failed, entry left unchanged");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Issue the lookup, waiting out any number of challenges. The same
    /// query is retried after each clearance.
    fn lookup_with_clearance(
        &mut self,
        query: &LookupQuery,
    ) -> Result<LookupOutcome, LookupError> {
        loop {
            match self.lookup.lookup(query)? {
                LookupOutcome::Blocked => {
                    info!(path = %query.metadata_path.display(), "challenge raised, awaiting operator");
                    self.prompt.await_clearance()?;
                }
                outcome => return Ok(outcome),
            }
        }
    }
}
