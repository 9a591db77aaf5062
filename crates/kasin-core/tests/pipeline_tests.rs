//! End-to-end pipeline behavior over scratch libraries

mod common;

use std::fs;

use kasin_core::apply::apply;
use kasin_core::clean::clean;
use kasin_core::db::{sync, CalibreDb};
use kasin_core::extract::extract;
use kasin_core::mapping::MappingSet;
use kasin_core::resolve::{ChallengePrompt, FileCheckpoint, Resolver};
use kasin_core::sources::{LookupOutcome, ScriptedLookup};
use kasin_core::{LookupConfig, Resolution};

struct NoPrompt;
impl ChallengePrompt for NoPrompt {
    fn await_clearance(&mut self) -> Result<(), kasin_core::error::LookupError> {
        panic!("unexpected challenge");
    }
}

fn quick_config() -> LookupConfig {
    LookupConfig {
        delay_seconds: 0,
        ..LookupConfig::default()
    }
}

#[test]
fn scrape_appends_found_identifier_to_line() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("amazon_ids.txt");
    fs::write(&mapping, "books/a.opf,B001XYZ\n").unwrap();

    let mut set = MappingSet::load(&mapping).unwrap();
    let lookup =
        ScriptedLookup::new().expect("books/a.opf", LookupOutcome::Found("B0ABCDE123".to_string()));
    let mut resolver = Resolver::new(lookup, NoPrompt, &quick_config());
    let mut checkpoint = FileCheckpoint::new(&mapping);

    let report = resolver.run(&mut set, &mut checkpoint).unwrap();
    assert_eq!(report.resolved, 1);
    assert_eq!(
        fs::read_to_string(&mapping).unwrap(),
        "books/a.opf,B001XYZ,B0ABCDE123\n"
    );
}

#[test]
fn scrape_not_found_leaves_line_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("amazon_ids.txt");
    fs::write(&mapping, "books/b.opf,,\n").unwrap();

    let mut set = MappingSet::load(&mapping).unwrap();
    let lookup = ScriptedLookup::new().expect("books/b.opf", LookupOutcome::NotFound);
    let mut resolver = Resolver::new(lookup, NoPrompt, &quick_config());
    let mut checkpoint = FileCheckpoint::new(&mapping);

    let report = resolver.run(&mut set, &mut checkpoint).unwrap();
    assert_eq!(report.none_found, 1);
    assert_eq!(fs::read_to_string(&mapping).unwrap(), "books/b.opf,,\n");
}

#[test]
fn scrape_preserves_entry_order() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("amazon_ids.txt");
    fs::write(&mapping, "books/a.opf,B001AAA\nbooks/b.opf,B001BBB\n").unwrap();

    let mut set = MappingSet::load(&mapping).unwrap();
    let lookup = ScriptedLookup::new()
        .expect(
            "books/a.opf",
            LookupOutcome::Ambiguous(vec!["B0AAAAAAA1".to_string(), "B0BBBBBBB2".to_string()]),
        )
        .expect("books/b.opf", LookupOutcome::Found("B0ABCDE123".to_string()));
    let mut resolver = Resolver::new(lookup, NoPrompt, &quick_config());
    let mut checkpoint = FileCheckpoint::new(&mapping);

    resolver.run(&mut set, &mut checkpoint).unwrap();
    assert_eq!(
        fs::read_to_string(&mapping).unwrap(),
        "books/a.opf,B001AAA\nbooks/b.opf,B001BBB,B0ABCDE123\n"
    );
}

#[test]
fn clean_then_extract_reproduces_old_id_set() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    common::write_book(&library, "Author/Book (1)", Some("B001XYZAB9"));
    common::write_book(&library, "Author/Book (2)", None);
    let mapping = dir.path().join("amazon_ids.txt");

    extract(&library, &mapping).unwrap();
    let mut baseline: Vec<(String, String)> = MappingSet::load(&mapping)
        .unwrap()
        .entries()
        .iter()
        .map(|e| (e.path.clone(), e.old_id.clone()))
        .collect();
    baseline.sort();

    // Resolve one entry, then clean and re-extract over the unchanged tree
    let mut set = MappingSet::load(&mapping).unwrap();
    let first_path = set.entries()[0].path.clone();
    set.set_resolution(&first_path, Resolution::Confirmed("B0ABCDE123".to_string()));
    set.save(&mapping).unwrap();

    let (cleaned, _) = clean(MappingSet::load(&mapping).unwrap());
    cleaned.save(&mapping).unwrap();
    extract(&library, &mapping).unwrap();

    let mut after: Vec<(String, String)> = MappingSet::load(&mapping)
        .unwrap()
        .entries()
        .iter()
        .map(|e| (e.path.clone(), e.old_id.clone()))
        .collect();
    after.sort();
    assert_eq!(baseline, after);
}

#[test]
fn update_then_sync_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    let opf_path = common::write_book(&library, "Author/Book (1)", Some("B001XYZAB9"));
    let db_path = common::calibre_db(&library, &[(1, "Author/Book (1)")]);

    // Confirmed mapping entry for the book
    let mapping_text = format!("{},B001XYZAB9,B0ABCDE123\n", opf_path.display());
    let set = MappingSet::parse(&mapping_text);

    let apply_report = apply(&set, &library).unwrap();
    assert_eq!(apply_report.updated, 1);

    let db = CalibreDb::open(&db_path).unwrap();
    let first = sync(&db, &library).unwrap();
    assert_eq!(first.updated, 1);
    assert_eq!(
        db.amazon_identifier(1).unwrap().as_deref(),
        Some("B0ABCDE123")
    );

    // Second run with no intervening changes performs zero writes
    let second = sync(&db, &library).unwrap();
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 1);
}

#[test]
fn extract_is_idempotent_over_unchanged_tree() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    common::write_book(&library, "Author/Book (1)", Some("B001XYZAB9"));
    let mapping = dir.path().join("amazon_ids.txt");

    extract(&library, &mapping).unwrap();
    let first = fs::read_to_string(&mapping).unwrap();
    extract(&library, &mapping).unwrap();
    assert_eq!(fs::read_to_string(&mapping).unwrap(), first);
}
