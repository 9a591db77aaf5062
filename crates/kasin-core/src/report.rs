//! Per-stage run summaries

use std::fmt;

use serde::Serialize;

/// Summary of an extraction run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExtractReport {
    /// Metadata files read successfully
    pub scanned: usize,
    /// Metadata files skipped as unreadable or unparseable
    pub skipped: usize,
    /// Entries carried over from a pre-existing mapping file
    pub carried_over: usize,
    /// Entries in the written mapping file
    pub total: usize,
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {} metadata files ({} skipped); mapping holds {} entries ({} carried over)",
            self.scanned, self.skipped, self.total, self.carried_over
        )
    }
}

/// Summary of a lookup run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ResolveReport {
    /// Entries attempted (everything without a confirmed identifier)
    pub attempted: usize,
    /// Entries confirmed with a Kindle-edition ASIN
    pub resolved: usize,
    /// Entries with no Kindle edition in the catalog
    pub none_found: usize,
    /// Entries with multiple candidates, left for manual review
    pub ambiguous: usize,
    /// Entries whose lookup failed; left unchanged
    pub failed: usize,
}

impl fmt::Display for ResolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted {} lookups: {} resolved, {} without a Kindle edition, {} ambiguous (manual review), {} failed",
            self.attempted, self.resolved, self.none_found, self.ambiguous, self.failed
        )
    }
}

/// Summary of a metadata-writer run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ApplyReport {
    /// Files rewritten with a new identifier
    pub updated: usize,
    /// Confirmed entries whose identifier already matched
    pub unchanged: usize,
    /// Entries without a confirmed identifier
    pub skipped: usize,
    /// Files that could not be read or rewritten
    pub failed: usize,
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} metadata files ({} already current, {} skipped, {} failed)",
            self.updated, self.unchanged, self.skipped, self.failed
        )
    }
}

/// Summary of a database-synchronizer run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    /// Identifier rows written
    pub updated: usize,
    /// Rows already holding the metadata value
    pub unchanged: usize,
    /// Books without a usable metadata identifier
    pub skipped: usize,
    /// Books whose row could not be read or written
    pub failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} database rows ({} already current, {} skipped, {} failed)",
            self.updated, self.unchanged, self.skipped, self.failed
        )
    }
}

/// Summary of a cleaner run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanReport {
    /// Resolved entries removed
    pub removed: usize,
    /// Negative-result markers stripped
    pub stripped: usize,
    /// Entries remaining in the mapping file
    pub kept: usize,
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} resolved entries, stripped {} markers, kept {}",
            self.removed, self.stripped, self.kept
        )
    }
}
