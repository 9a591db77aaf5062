//! Cleaner
//!
//! Resets a mapping set to pure `(path, old_id)` pairs so the file can
//! seed a fresh extraction: resolved entries are dropped (re-merging them
//! would pin a stale identifier next to a possibly-changed old one) and
//! negative-result markers are stripped.

use crate::mapping::{MappingEntry, MappingSet, Resolution};
use crate::report::CleanReport;

pub fn clean(set: MappingSet) -> (MappingSet, CleanReport) {
    let mut out = MappingSet::new();
    let mut report = CleanReport::default();

    for entry in set.into_entries() {
        match entry.resolution {
            Resolution::Confirmed(_) => report.removed += 1,
            Resolution::NoneFound => {
                report.stripped += 1;
                out.insert(MappingEntry::pending(entry.path, entry.old_id));
            }
            Resolution::Pending => out.insert(entry),
        }
    }

    report.kept = out.len();
    (out, report)
}
