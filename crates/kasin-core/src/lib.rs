//! kasin-core: the ASIN reconciliation pipeline
//!
//! Five strictly sequential stages coordinate through a line-oriented
//! mapping file:
//! - extraction of the recorded identifier from every `.opf` file
//! - catalog lookup with operator-supervised challenge handling
//! - metadata rewriting with the verified Kindle-edition ASIN
//! - synchronization of the Calibre database from the metadata files
//! - mapping cleanup so a file can seed a fresh run
//!
//! Each stage is independently invocable and re-entrant against the same
//! mapping file, which is the pipeline's sole coordination artifact.

pub mod apply;
pub mod clean;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod opf;
pub mod report;
pub mod resolve;
pub mod sources;
pub mod walk;

pub use config::LookupConfig;
pub use error::{KasinError, Result};
pub use mapping::{MappingEntry, MappingSet, Resolution};
pub use report::{ApplyReport, CleanReport, ExtractReport, ResolveReport, SyncReport};
