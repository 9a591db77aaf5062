//! Shared fixtures: scratch Calibre libraries and databases

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

/// A minimal Calibre-style OPF document, optionally carrying an AMAZON
/// identifier.
pub fn opf(asin: Option<&str>) -> String {
    let identifier = match asin {
        Some(asin) => {
            format!("    <dc:identifier opf:scheme=\"AMAZON\">{asin}</dc:identifier>\n")
        }
        None => String::new(),
    };
    format!(
        r#"<?xml version='1.0' encoding='utf-8'?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>A Book</dc:title>
    <dc:creator opf:role="aut">Someone</dc:creator>
{identifier}    <dc:language>en</dc:language>
  </metadata>
</package>
"#
    )
}

/// Create `<root>/<rel>/metadata.opf` and return its path.
pub fn write_book(root: &Path, rel: &str, asin: Option<&str>) -> PathBuf {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("metadata.opf");
    fs::write(&path, opf(asin)).unwrap();
    path
}

/// Create a Calibre-shaped `metadata.db` at the library root with the
/// given `(id, path)` book rows. Returns the database path.
pub fn calibre_db(root: &Path, books: &[(i64, &str)]) -> PathBuf {
    let db_path = root.join("metadata.db");
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
    for (id, rel) in books {
        conn.execute(
            "INSERT INTO books (id, path) VALUES (?1, ?2)",
            params![id, rel],
        )
        .unwrap();
    }
    db_path
}
