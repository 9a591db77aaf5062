//! ASIN handling for the kasin toolchain
//!
//! Provides functions for validating, normalizing, and extracting Amazon
//! catalog identifiers (ASINs):
//! - Syntax validation for Kindle-edition ASINs (`B0` prefix)
//! - Normalization of the forms found in Calibre metadata and product URLs
//! - Extraction of ASINs from free text such as product-page HTML

pub mod extractors;
pub mod validators;

pub use extractors::extract_asins;
pub use validators::{is_valid_asin, normalize_asin};
