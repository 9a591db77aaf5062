//! Metadata writer stage
//!
//! Writes confirmed identifiers back into the `.opf` files. One bad file
//! never blocks the rest of the batch, and each rewrite is atomic so an
//! interrupt cannot leave a truncated metadata file.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{KasinError, MetadataError};
use crate::mapping::MappingSet;
use crate::opf::OpfDocument;
use crate::report::ApplyReport;

pub fn apply(set: &MappingSet, root_dir: &Path) -> Result<ApplyReport, KasinError> {
    let mut report = ApplyReport::default();

    for entry in set.entries() {
        let Some(new_id) = entry.resolution.confirmed() else {
            report.skipped += 1;
            continue;
        };
        if new_id == entry.old_id {
            report.unchanged += 1;
            continue;
        }

        let path = resolve_path(root_dir, &entry.path);
        match rewrite(&path, new_id) {
            Ok(()) => {
                info!(path = %path.display(), asin = %new_id, "updated metadata identifier");
                report.updated += 1;
            }
            Err(err) => {
                warn!(%err, "failed to update metadata file");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

fn resolve_path(root: &Path, entry_path: &str) -> PathBuf {
    let path = Path::new(entry_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn rewrite(path: &Path, new_id: &str) -> Result<(), MetadataError> {
    let doc = OpfDocument::load(path)?;
    let rewritten = doc.with_identifier(new_id)?;
    doc.save(&rewritten)
}
