//! Library tree traversal

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{KasinError, Result};

/// Collect every `.opf` metadata file under `root`, sorted by path.
///
/// The walk is fully materialized so callers can iterate (and re-iterate)
/// the result without touching the filesystem again. Unreadable directory
/// entries are logged and skipped; a missing root is fatal.
pub fn metadata_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(KasinError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let is_opf = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("opf"));
                if is_opf {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "skipping unreadable directory entry"),
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_opf_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("Author/Book (1)");
        let b = dir.path().join("Other/Book (2)");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("metadata.opf"), "<package/>").unwrap();
        fs::write(b.join("metadata.opf"), "<package/>").unwrap();
        fs::write(b.join("cover.jpg"), "not xml").unwrap();

        let files = metadata_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.ends_with("metadata.opf")));
        // Sorted output is stable across runs
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = metadata_files(Path::new("/no/such/library")).unwrap_err();
        assert!(matches!(err, KasinError::DirectoryNotFound(_)));
    }
}
