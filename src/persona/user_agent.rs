//! Rotating browser User-Agent pool for extraction personas.
//!
//! Single source for the strings so metadata and conversion attempts stay
//! consistent and the pool is easy to refresh when browser versions move on.

/// Realistic browser User-Agent strings, rotated by persona index.
///
/// The length is coprime with the identity rotation so consecutive personas
/// pair each identity with a different browser.
pub(crate) const USER_AGENT_POOL: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

/// User-Agent for a given persona index.
#[must_use]
pub(crate) fn user_agent_for(index: u32) -> &'static str {
    USER_AGENT_POOL[index as usize % USER_AGENT_POOL.len()]
}
