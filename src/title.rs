//! Title cleaning for upstream video titles.
//!
//! Turns arbitrary upstream text into a short, human-readable identifier that
//! is safe to show in a download dialog. The pipeline is order-sensitive:
//!
//! 1. strip emoji, pictograph and symbol code point bands
//! 2. strip anything outside ASCII word characters, whitespace and `-_.(),!?'"`
//! 3. collapse whitespace runs and trim
//! 4. fall back to [`UNTITLED`] when nothing survives
//!
//! Filesystem safety is a separate pass, see
//! [`sanitize_file_stem`](crate::download::sanitize_file_stem).

use std::sync::LazyLock;

use regex::Regex;

/// Returned when cleaning leaves nothing behind.
pub const UNTITLED: &str = "untitled";

#[allow(clippy::expect_used)]
static SYMBOL_BANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F600}-\x{1F64F}", // emoticons
        r"\x{1F300}-\x{1F5FF}", // misc symbols and pictographs
        r"\x{1F680}-\x{1F6FF}", // transport and map
        r"\x{1F1E0}-\x{1F1FF}", // regional indicator flags
        r"\x{2600}-\x{26FF}",   // misc symbols
        r"\x{2700}-\x{27BF}",   // dingbats
        r"\x{1F900}-\x{1F9FF}", // supplemental symbols and pictographs
        r"\x{1F018}-\x{1F270}", // enclosed and various symbols
        r"\x{238C}-\x{2454}",   // misc technical
        r"\x{20D0}-\x{20FF}",   // combining marks for symbols
        "]",
    ))
    .expect("symbol band regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^A-Za-z0-9_\s\-.(),!?'"]"#).expect("allowed-character regex is valid")
});

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Cleans a raw upstream title.
///
/// Idempotent and never returns an empty string.
///
/// # Examples
///
/// ```
/// use audio_fetch_core::title::clean_title;
///
/// assert_eq!(clean_title("🔥 Live   at Wembley 🎸 (1986)"), "Live at Wembley (1986)");
/// assert_eq!(clean_title("🎵🎶"), "untitled");
/// ```
#[must_use]
pub fn clean_title(raw: &str) -> String {
    let without_symbols = SYMBOL_BANDS.replace_all(raw, "");
    let allowed_only = DISALLOWED.replace_all(&without_symbols, "");
    let collapsed = WHITESPACE_RUN.replace_all(&allowed_only, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BAND_SAMPLES: [char; 10] = [
        '\u{1F600}', '\u{1F3B5}', '\u{1F680}', '\u{1F1FA}', '\u{2600}', '\u{2714}', '\u{1F92F}',
        '\u{1F170}', '\u{23F0}', '\u{20E3}',
    ];

    #[test]
    fn test_strips_every_symbol_band() {
        for ch in BAND_SAMPLES {
            let raw = format!("a{ch}b");
            let cleaned = clean_title(&raw);
            assert!(!cleaned.contains(ch), "band char {ch:?} survived");
            assert_eq!(cleaned, "ab");
        }
    }

    #[test]
    fn test_flag_pair_removed() {
        assert_eq!(clean_title("Anthem \u{1F1FA}\u{1F1F8}"), "Anthem");
    }

    #[test]
    fn test_keeps_basic_punctuation() {
        let raw = r#"Don't Stop - "Remastered" (2011), Vol. 2! Why?"#;
        assert_eq!(clean_title(raw), raw);
    }

    #[test]
    fn test_strips_other_symbols_and_non_ascii_letters() {
        assert_eq!(clean_title("Rock & Roll / Live #1"), "Rock Roll Live 1");
        assert_eq!(clean_title("Café del Mar"), "Caf del Mar");
        assert_eq!(clean_title("日本語"), UNTITLED);
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(clean_title("  a \t\n  b  "), "a b");
        assert_eq!(clean_title("a\u{00A0}\u{2003}b"), "a b");
    }

    #[test]
    fn test_empty_results_fall_back_to_untitled() {
        assert_eq!(clean_title(""), UNTITLED);
        assert_eq!(clean_title("   "), UNTITLED);
        assert_eq!(clean_title("😀😀"), UNTITLED);
        assert_eq!(clean_title("@#$%"), UNTITLED);
    }

    #[test]
    fn test_idempotent_over_mixed_inputs() {
        let inputs = [
            "",
            "😀 hi 😀",
            "  spaced   out  ",
            "Café ☕ at 5 o'clock",
            "a \u{20DD} b",
            "🇯🇵 Tokyo Drift (Official Video) [HD]",
            "untitled",
            "\u{00A0}\u{00A0}x",
        ];
        for input in inputs {
            let once = clean_title(input);
            assert_eq!(clean_title(&once), once, "not idempotent for {input:?}");
            assert!(!once.is_empty());
        }
    }
}
