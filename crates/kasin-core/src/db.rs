//! Calibre database repository and synchronizer stage
//!
//! Calibre keeps `metadata.db` at the library root; `books.path` is the
//! book directory relative to that root, and the `identifiers` table holds
//! one row per (book, type) with `type = 'amazon'` carrying the ASIN. The
//! synchronizer treats the `.opf` files as ground truth and only ever
//! writes rows whose value actually differs.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::error::{DatabaseError, KasinError};
use crate::opf::OpfDocument;
use crate::report::SyncReport;

/// Read-write handle on an existing Calibre `metadata.db`.
pub struct CalibreDb {
    conn: Connection,
}

/// One row of the `books` table.
pub struct BookRow {
    pub id: i64,
    /// Book directory relative to the library root
    pub path: String,
}

impl CalibreDb {
    /// Open an existing database. Opened without CREATE so a wrong path is
    /// an error instead of a silently created empty database.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE).map_err(
            |e| DatabaseError::Unreachable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        )?;
        Ok(Self { conn })
    }

    pub fn books(&self) -> Result<Vec<BookRow>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT id, path FROM books ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(BookRow {
                id: row.get(0)?,
                path: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Current amazon identifier for a book, if recorded.
    pub fn amazon_identifier(&self, book_id: i64) -> Result<Option<String>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT val FROM identifiers WHERE book = ?1 AND type = 'amazon'",
                params![book_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Upsert the amazon identifier for a book.
    pub fn set_amazon_identifier(&self, book_id: i64, asin: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO identifiers (book, type, val) VALUES (?1, 'amazon', ?2)
             ON CONFLICT(book, type) DO UPDATE SET val = excluded.val",
            params![book_id, asin],
        )?;
        Ok(())
    }
}

/// Propagate identifiers from the metadata files into the database.
///
/// Idempotent: rows already holding the metadata value are left untouched,
/// so a repeat run with no intervening file changes performs zero writes.
pub fn sync(db: &CalibreDb, library_root: &Path) -> Result<SyncReport, KasinError> {
    let mut report = SyncReport::default();

    for book in db.books()? {
        let opf_path = library_root.join(&book.path).join("metadata.opf");
        let asin = match OpfDocument::load(&opf_path).and_then(|doc| doc.identifier()) {
            Ok(Some(asin)) if !asin.is_empty() => asin,
            Ok(_) => {
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(book = book.id, %err, "skipping book with unusable metadata");
                report.skipped += 1;
                continue;
            }
        };

        match db.amazon_identifier(book.id) {
            Ok(current) if current.as_deref() == Some(asin.as_str()) => report.unchanged += 1,
            Ok(_) => match db.set_amazon_identifier(book.id, &asin) {
                Ok(()) => {
                    info!(book = book.id, asin = %asin, "updated database identifier");
                    report.updated += 1;
                }
                Err(err) => {
                    warn!(book = book.id, %err, "failed to write identifier row");
                    report.failed += 1;
                }
            },
            Err(err) => {
                warn!(book = book.id, %err, "failed to read identifier row");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_library(books: &[(i64, &str, Option<&str>)]) -> (tempfile::TempDir, CalibreDb) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("metadata.db");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE books (id INTEGER PRIMARY KEY, path TEXT NOT NULL);
             CREATE TABLE identifiers (
                 id INTEGER PRIMARY KEY,
                 book INTEGER NOT NULL,
                 type TEXT NOT NULL,
                 val TEXT NOT NULL,
                 UNIQUE(book, type)
             );",
        )
        .unwrap();

        for (id, rel, asin) in books {
            conn.execute(
                "INSERT INTO books (id, path) VALUES (?1, ?2)",
                params![id, rel],
            )
            .unwrap();
            let book_dir = dir.path().join(rel);
            fs::create_dir_all(&book_dir).unwrap();
            if let Some(asin) = asin {
                fs::write(
                    book_dir.join("metadata.opf"),
                    format!(
                        r#"<package><metadata xmlns:dc="d" xmlns:opf="o"><dc:identifier opf:scheme="AMAZON">{asin}</dc:identifier></metadata></package>"#
                    ),
                )
                .unwrap();
            }
        }
        drop(conn);

        let db = CalibreDb::open(&db_path).unwrap();
        (dir, db)
    }

    #[test]
    fn test_open_missing_db_is_error() {
        assert!(CalibreDb::open(Path::new("/no/such/metadata.db")).is_err());
    }

    #[test]
    fn test_sync_inserts_and_updates() {
        let (dir, db) = scratch_library(&[
            (1, "Author/Book (1)", Some("B0ABCDE123")),
            (2, "Author/Book (2)", Some("B0FGHIJ456")),
        ]);
        db.set_amazon_identifier(2, "B001OLDOLD").unwrap();

        let report = sync(&db, dir.path()).unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(db.amazon_identifier(1).unwrap().as_deref(), Some("B0ABCDE123"));
        assert_eq!(db.amazon_identifier(2).unwrap().as_deref(), Some("B0FGHIJ456"));
    }

    #[test]
    fn test_sync_twice_writes_nothing_second_time() {
        let (dir, db) = scratch_library(&[(1, "Book", Some("B0ABCDE123"))]);

        let first = sync(&db, dir.path()).unwrap();
        assert_eq!(first.updated, 1);

        let second = sync(&db, dir.path()).unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn test_sync_skips_books_without_metadata() {
        let (dir, db) = scratch_library(&[(1, "NoOpf", None)]);
        let report = sync(&db, dir.path()).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 0);
    }
}
