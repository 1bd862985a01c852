//! Netscape cookie file rendering for synthetic identity personas.
//!
//! The extraction tool accepts a Netscape HTTP cookie file (7 TAB-separated
//! fields per line). Synthetic personas carry a small set of consent and
//! preference cookies that are written to a short-lived file per attempt.

use std::fmt;
use std::fmt::Write as _;

/// Header line expected at the top of a Netscape cookie file.
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

/// Domain scope used for synthetic cookies.
const COOKIE_DOMAIN: &str = ".youtube.com";

/// A single cookie in Netscape file form.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of cookie data.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieLine {
    /// The domain the cookie belongs to (e.g., `.example.com`).
    pub domain: String,
    /// Whether subdomains should match.
    pub tailmatch: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    /// Cookie value (never log).
    value: String,
}

impl CookieLine {
    /// Creates a session cookie scoped to `/` on `domain` with subdomain matching.
    #[must_use]
    pub fn session(domain: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            tailmatch: true,
            path: "/".to_string(),
            secure: true,
            expires: 0,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("tailmatch", &self.tailmatch)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Builds the deterministic synthetic cookie set for a persona index.
///
/// Consent and preference cookies are fixed; the visitor token varies with
/// `seed` so that distinct attempts present distinct visitor identities.
#[must_use]
pub fn synthetic_cookies(seed: u32) -> Vec<CookieLine> {
    vec![
        CookieLine::session(COOKIE_DOMAIN, "CONSENT", "YES+cb.20210328-17-p0.en+FX+917"),
        CookieLine::session(COOKIE_DOMAIN, "PREF", "hl=en&gl=US&f6=40000000"),
        CookieLine::session(COOKIE_DOMAIN, "VISITOR_INFO1_LIVE", visitor_token(seed)),
        CookieLine::session(COOKIE_DOMAIN, "YSC", format!("ysc{seed:08x}")),
    ]
}

/// Derives an 11-character URL-safe visitor token from a seed.
fn visitor_token(seed: u32) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    // splitmix-style mixing keeps neighbouring seeds far apart
    let mut state = u64::from(seed).wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut token = String::with_capacity(11);
    for _ in 0..11 {
        state ^= state >> 30;
        state = state.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        state ^= state >> 27;
        token.push(char::from(ALPHABET[(state % 64) as usize]));
    }
    token
}

/// Renders cookies as a Netscape cookie file, header included.
#[must_use]
pub fn render_netscape_cookies(cookies: &[CookieLine]) -> String {
    let mut out = String::from(NETSCAPE_HEADER);
    out.push('\n');
    for cookie in cookies {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            cookie.domain,
            bool_field(cookie.tailmatch),
            cookie.path,
            bool_field(cookie.secure),
            cookie.expires,
            cookie.name,
            cookie.value()
        );
    }
    out
}

fn bool_field(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}
