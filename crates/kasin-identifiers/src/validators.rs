//! ASIN validation and normalization

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Kindle-edition ASIN: "B0" followed by eight uppercase alphanumerics
    static ref ASIN_PATTERN: Regex = Regex::new(r"^B0[A-Z0-9]{8}$").unwrap();

    // /dp/<asin> or /gp/product/<asin> path segment inside a product URL
    static ref DP_SEGMENT: Regex =
        Regex::new(r"/(?:dp|gp/product)/([A-Za-z0-9]{10})").unwrap();
}

/// Check whether a string is a syntactically valid Kindle-edition ASIN.
pub fn is_valid_asin(asin: &str) -> bool {
    ASIN_PATTERN.is_match(asin)
}

/// Normalize an ASIN as found in Calibre metadata or a product URL.
///
/// Trims whitespace, strips `ASIN:`/`amazon:`/`urn:asin:` scheme prefixes,
/// pulls the identifier out of a `/dp/` or `/gp/product/` URL, and
/// uppercases the result. Does not validate; pair with [`is_valid_asin`].
pub fn normalize_asin(asin: &str) -> String {
    let mut result = asin.trim().to_string();

    if let Some(cap) = DP_SEGMENT.captures(&result) {
        result = cap[1].to_string();
    }

    let prefixes = ["urn:asin:", "amazon:", "asin:", "ASIN:", "AMAZON:"];
    for prefix in prefixes {
        if let Some(stripped) = result.strip_prefix(prefix) {
            result = stripped.to_string();
            break;
        }
    }

    result.trim().to_ascii_uppercase()
}
