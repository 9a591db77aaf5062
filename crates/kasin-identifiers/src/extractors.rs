//! ASIN extraction from free text

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Kindle-edition ASINs in running text: bare codes or /dp/ hrefs
    static ref ASIN_REGEX: Regex =
        Regex::new(r"(?:/(?:dp|gp/product)/)?\b(B0[A-Z0-9]{8})\b").unwrap();
}

/// Extract Kindle-edition ASINs from text, in order of appearance.
///
/// Matches bare `B0…` codes as well as codes embedded in `/dp/` and
/// `/gp/product/` hrefs. Duplicates are dropped, first occurrence wins.
pub fn extract_asins(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for cap in ASIN_REGEX.captures_iter(text) {
        let asin = cap[1].to_string();
        if !seen.contains(&asin) {
            seen.push(asin);
        }
    }
    seen
}
