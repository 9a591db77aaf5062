//! Extraction stage
//!
//! Harvests the identifier currently recorded in every `.opf` file under
//! the library root and merges the results into the mapping file, so a
//! leftover mapping from a prior (possibly interrupted) run keeps its
//! resolved entries.

use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::mapping::{MappingEntry, MappingSet};
use crate::opf::OpfDocument;
use crate::report::ExtractReport;
use crate::walk::metadata_files;

pub fn extract(root_dir: &Path, mapping_path: &Path) -> Result<ExtractReport> {
    let files = metadata_files(root_dir)?;

    let mut set = if mapping_path.exists() {
        MappingSet::load(mapping_path)?
    } else {
        MappingSet::new()
    };

    let mut report = ExtractReport {
        carried_over: set.len(),
        ..ExtractReport::default()
    };

    for file in files {
        match OpfDocument::load(&file).and_then(|doc| doc.identifier()) {
            Ok(old_id) => {
                set.insert(MappingEntry::pending(
                    file.to_string_lossy().into_owned(),
                    old_id.unwrap_or_default(),
                ));
                report.scanned += 1;
            }
            Err(err) => {
                warn!(%err, "skipping unusable metadata file");
                report.skipped += 1;
            }
        }
    }

    set.save(mapping_path)?;
    report.total = set.len();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn opf_with_identifier(asin: &str) -> String {
        format!(
            r#"<?xml version='1.0' encoding='utf-8'?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>T</dc:title>
    <dc:identifier opf:scheme="AMAZON">{asin}</dc:identifier>
  </metadata>
</package>
"#
        )
    }

    #[test]
    fn test_extract_builds_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("library/Author/Book (1)");
        fs::create_dir_all(&book).unwrap();
        fs::write(book.join("metadata.opf"), opf_with_identifier("B001XYZAB9")).unwrap();
        let mapping = dir.path().join("amazon_ids.txt");

        let report = extract(&dir.path().join("library"), &mapping).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.total, 1);

        let set = MappingSet::load(&mapping).unwrap();
        let entry = &set.entries()[0];
        assert!(entry.path.ends_with("metadata.opf"));
        assert_eq!(entry.old_id, "B001XYZAB9");
    }

    #[test]
    fn test_extract_merges_with_existing_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("library/Book");
        fs::create_dir_all(&book).unwrap();
        let opf_path = book.join("metadata.opf");
        fs::write(&opf_path, opf_with_identifier("B001XYZAB9")).unwrap();

        // A prior run already confirmed this entry
        let mapping = dir.path().join("amazon_ids.txt");
        fs::write(
            &mapping,
            format!("{},B001XYZAB9,B0ABCDE123\n", opf_path.display()),
        )
        .unwrap();

        let report = extract(&dir.path().join("library"), &mapping).unwrap();
        assert_eq!(report.carried_over, 1);
        assert_eq!(report.total, 1);

        let set = MappingSet::load(&mapping).unwrap();
        assert!(set.entries()[0].resolution.is_confirmed());
    }

    #[test]
    fn test_extract_skips_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("library/Bad");
        fs::create_dir_all(&book).unwrap();
        fs::write(book.join("metadata.opf"), "<package><metadata></wrong>").unwrap();
        let mapping = dir.path().join("amazon_ids.txt");

        let report = extract(&dir.path().join("library"), &mapping).unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_extract_missing_identifier_yields_empty_old_id() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("library/NoId");
        fs::create_dir_all(&book).unwrap();
        fs::write(
            book.join("metadata.opf"),
            r#"<package><metadata xmlns:dc="d"><dc:title>T</dc:title></metadata></package>"#,
        )
        .unwrap();
        let mapping = dir.path().join("amazon_ids.txt");

        extract(&dir.path().join("library"), &mapping).unwrap();
        let set = MappingSet::load(&mapping).unwrap();
        assert_eq!(set.entries()[0].old_id, "");
    }
}
