//! Request persona generation for extraction attempts.
//!
//! A [`Persona`] is one complete set of request-identity parameters (headers,
//! identity source, User-Agent) used for a single extraction attempt. The
//! [`PersonaGenerator`] maps an attempt index to a persona through a fixed,
//! deterministic rotation:
//!
//! - identity source cycles through no identity, two named browser cookie
//!   jars and a synthetic cookie file
//! - User-Agent cycles through a pool whose length is coprime with the
//!   identity rotation
//! - every persona carries the same realistic navigation header template
//! - from the second identity cycle onwards, supplementary marker headers are
//!   layered on, one more per cycle
//!
//! Personas are therefore pairwise distinct for every index an escalation run
//! can reach, and the same index always yields the same persona.

mod cookies;
mod user_agent;

use std::collections::BTreeSet;
use std::fmt;

pub use cookies::{CookieLine, NETSCAPE_HEADER, render_netscape_cookies, synthetic_cookies};

use user_agent::user_agent_for;

/// Number of distinct identity sources in the rotation.
pub const IDENTITY_ROTATION_LEN: u32 = 4;

/// Navigation header template shared by every persona.
const BASE_HEADERS: [(&str, &str); 8] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Referer", "https://www.youtube.com/"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Supplementary markers: (token, header name, header value).
const MARKERS: [(&str, &str, &str); 6] = [
    ("dnt", "DNT", "1"),
    ("sec-gpc", "Sec-GPC", "1"),
    ("no-cache", "Cache-Control", "no-cache"),
    ("pragma", "Pragma", "no-cache"),
    ("save-data", "Save-Data", "on"),
    ("priority", "Priority", "u=0, i"),
];

/// Where an attempt's identity credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// No cookies at all.
    None,
    /// Cookies read by the extraction tool from a named local browser profile.
    NamedBrowser(&'static str),
    /// Cookies written to a short-lived Netscape cookie file for the attempt.
    SyntheticCookieFile(Vec<CookieLine>),
}

impl IdentitySource {
    /// Stable label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NamedBrowser(name) => *name,
            Self::SyntheticCookieFile(_) => "synthetic-cookie-file",
        }
    }
}

/// One immutable set of request-identity parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    index: u32,
    identity_source: IdentitySource,
    user_agent: &'static str,
    header_set: Vec<(String, String)>,
    extra_markers: BTreeSet<&'static str>,
}

impl Persona {
    /// Attempt index this persona was generated for.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Identity source bound to this persona.
    #[must_use]
    pub fn identity_source(&self) -> &IdentitySource {
        &self.identity_source
    }

    /// User-Agent string.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    /// Ordered request headers (template first, markers after).
    #[must_use]
    pub fn header_set(&self) -> &[(String, String)] {
        &self.header_set
    }

    /// Supplementary marker tokens.
    #[must_use]
    pub fn extra_markers(&self) -> &BTreeSet<&'static str> {
        &self.extra_markers
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "persona#{} identity={} markers={}",
            self.index,
            self.identity_source.label(),
            self.extra_markers.len()
        )
    }
}

/// Deterministic persona rotation.
///
/// Stateless: the attempt index is the only input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaGenerator;

impl PersonaGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the persona for `attempt_index`.
    #[must_use]
    pub fn next(&self, attempt_index: u32) -> Persona {
        let identity_source = match attempt_index % IDENTITY_ROTATION_LEN {
            0 => IdentitySource::None,
            1 => IdentitySource::NamedBrowser("chrome"),
            2 => IdentitySource::NamedBrowser("firefox"),
            _ => IdentitySource::SyntheticCookieFile(synthetic_cookies(attempt_index)),
        };

        let marker_count = ((attempt_index / IDENTITY_ROTATION_LEN) as usize).min(MARKERS.len());

        let mut header_set: Vec<(String, String)> = BASE_HEADERS
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        let mut extra_markers = BTreeSet::new();
        for (token, name, value) in &MARKERS[..marker_count] {
            header_set.push(((*name).to_string(), (*value).to_string()));
            extra_markers.insert(*token);
        }

        Persona {
            index: attempt_index,
            identity_source,
            user_agent: user_agent_for(attempt_index),
            header_set,
            extra_markers,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fingerprint(p: &Persona) -> (IdentitySource, String, Vec<(String, String)>) {
        (
            p.identity_source().clone(),
            p.user_agent().to_string(),
            p.header_set().to_vec(),
        )
    }

    #[test]
    fn test_same_index_yields_same_persona() {
        let generator = PersonaGenerator::new();
        for i in 0..12 {
            assert_eq!(generator.next(i), generator.next(i));
        }
    }

    #[test]
    fn test_first_rotation_binds_distinct_identities() {
        let generator = PersonaGenerator::new();
        assert_eq!(generator.next(0).identity_source(), &IdentitySource::None);
        assert_eq!(
            generator.next(1).identity_source(),
            &IdentitySource::NamedBrowser("chrome")
        );
        assert_eq!(
            generator.next(2).identity_source(),
            &IdentitySource::NamedBrowser("firefox")
        );
        assert!(matches!(
            generator.next(3).identity_source(),
            IdentitySource::SyntheticCookieFile(cookies) if !cookies.is_empty()
        ));
    }

    #[test]
    fn test_personas_are_pairwise_distinct_across_reachable_indices() {
        let generator = PersonaGenerator::new();
        let prints: Vec<_> = (0..20).map(|i| fingerprint(&generator.next(i))).collect();
        for (i, a) in prints.iter().enumerate() {
            for (j, b) in prints.iter().enumerate().skip(i + 1) {
                assert_ne!(a, b, "persona {i} and {j} collide");
            }
        }
    }

    #[test]
    fn test_base_template_always_present_in_order() {
        let generator = PersonaGenerator::new();
        for i in [0, 5, 11] {
            let persona = generator.next(i);
            let names: Vec<&str> = persona
                .header_set()
                .iter()
                .take(BASE_HEADERS.len())
                .map(|(n, _)| n.as_str())
                .collect();
            let expected: Vec<&str> = BASE_HEADERS.iter().map(|(n, _)| *n).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_markers_only_after_first_rotation() {
        let generator = PersonaGenerator::new();
        for i in 0..IDENTITY_ROTATION_LEN {
            assert!(generator.next(i).extra_markers().is_empty());
            assert_eq!(generator.next(i).header_set().len(), BASE_HEADERS.len());
        }
        let fifth = generator.next(4);
        assert_eq!(fifth.extra_markers().len(), 1);
        assert!(fifth.extra_markers().contains("dnt"));
        assert_eq!(fifth.header_set().len(), BASE_HEADERS.len() + 1);
        assert_eq!(generator.next(9).extra_markers().len(), 2);
    }

    #[test]
    fn test_marker_count_is_capped() {
        let generator = PersonaGenerator::new();
        assert_eq!(generator.next(1000).extra_markers().len(), MARKERS.len());
    }

    #[test]
    fn test_display_mentions_index_and_identity() {
        let persona = PersonaGenerator::new().next(2);
        let shown = persona.to_string();
        assert!(shown.contains("persona#2"));
        assert!(shown.contains("firefox"));
    }
}
