//! Amazon product-page source for Kindle-edition ASINs
//!
//! Fetches `https://www.amazon.com/dp/<asin>` with a blocking agent and
//! classifies the page. A product page lists its format variants as
//! "slots"; the anchor wrapping the "Kindle Format:" slot carries the
//! Kindle edition's `/dp/` href. One request per lookup; pacing between
//! requests is the resolver's job.

use std::time::Duration;

use kasin_identifiers::{extract_asins, is_valid_asin, normalize_asin};
use tracing::debug;

use super::{KindleLookup, LookupOutcome, LookupQuery};
use crate::config::LookupConfig;
use crate::error::LookupError;

// Markers of the anti-robot interstitial
const CHALLENGE_MARKERS: &[&str] = &[
    "/errors/validateCaptcha",
    "Type the characters you see in this image",
    "api-services-support@amazon.com",
];

// Anchor text of the Kindle slot on a product page
const KINDLE_SLOT_MARKER: &str = "Kindle Format:";

// The slot's href sits shortly before its anchor text in the raw HTML
const KINDLE_SLOT_LOOKBACK: usize = 2048;

pub struct AmazonKindleSource {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
}

impl AmazonKindleSource {
    pub fn new(config: &LookupConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn fetch(&self, url: &str) -> Result<(u16, String), LookupError> {
        debug!(%url, "fetching product page");
        match self.agent.get(url).set("User-Agent", &self.user_agent).call() {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| LookupError::Request(e.to_string()))?;
                Ok((status, body))
            }
            // Challenge interstitials arrive as non-2xx pages, so keep the
            // body for classification instead of failing outright
            Err(ureq::Error::Status(status, response)) => {
                Ok((status, response.into_string().unwrap_or_default()))
            }
            Err(ureq::Error::Transport(err)) => Err(LookupError::Request(err.to_string())),
        }
    }
}

impl KindleLookup for AmazonKindleSource {
    fn lookup(&mut self, query: &LookupQuery) -> Result<LookupOutcome, LookupError> {
        let old_id = normalize_asin(&query.old_id);
        if old_id.is_empty() {
            // Nothing to build a product URL from; a richer source could
            // derive a title/author query from the metadata path instead
            return Ok(LookupOutcome::NotFound);
        }

        let url = format!("{}/dp/{}", self.base_url, old_id);
        let (status, body) = self.fetch(&url)?;

        if is_challenge(&body) {
            return Ok(LookupOutcome::Blocked);
        }
        if status == 404 {
            return Ok(LookupOutcome::NotFound);
        }
        if !(200..300).contains(&status) {
            return Err(LookupError::Status(status));
        }
        Ok(classify_page(&old_id, &body))
    }
}

fn is_challenge(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Classify a product page that loaded normally.
fn classify_page(old_id: &str, body: &str) -> LookupOutcome {
    let Some(marker_pos) = body.find(KINDLE_SLOT_MARKER) else {
        // No Kindle slot at all: the work has no Kindle edition
        return LookupOutcome::NotFound;
    };

    // Scan the window before the slot's anchor text for its /dp/ href
    let mut start = marker_pos.saturating_sub(KINDLE_SLOT_LOOKBACK);
    while !body.is_char_boundary(start) {
        start += 1;
    }
    let window = &body[start..marker_pos];

    let candidates = extract_asins(window);
    match candidates.len() {
        // A Kindle slot without its own anchor means this page already is
        // the Kindle edition
        0 if is_valid_asin(old_id) => LookupOutcome::Found(old_id.to_string()),
        0 => LookupOutcome::NotFound,
        1 => LookupOutcome::Found(candidates.into_iter().next().unwrap_or_default()),
        _ => LookupOutcome::Ambiguous(candidates),
    }
}
