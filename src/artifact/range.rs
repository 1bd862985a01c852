//! `Range` request header interpretation for single byte ranges.

use axum::http::HeaderValue;

/// An inclusive byte span within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a range covers at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// What a request's `Range` header asks for, resolved against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range: send the whole file.
    Full,
    /// A satisfiable single range.
    Partial(ByteRange),
    /// A well-formed range starting at or past the end of the file.
    Unsatisfiable,
}

/// Resolves a `Range` header against a file of `size` bytes.
///
/// Only single `bytes=` ranges are honored. Open ends default to the last
/// byte, ends past the file are clamped, and `bytes=-N` selects the final N
/// bytes. Headers that are absent, malformed, multi-range or use another unit
/// yield [`RangeRequest::Full`].
#[must_use]
pub fn parse_range_header(value: Option<&HeaderValue>, size: u64) -> RangeRequest {
    let Some(value) = value else {
        return RangeRequest::Full;
    };
    parse_spec(value, size).unwrap_or(RangeRequest::Full)
}

fn parse_spec(value: &HeaderValue, size: u64) -> Option<RangeRequest> {
    let value = value.to_str().ok()?.trim();
    let (unit, spec) = value.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }
    let spec = spec.trim();
    if spec.is_empty() || spec.contains(',') {
        return None;
    }
    let (start_str, end_str) = spec.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        // Suffix range: "-N" means the last N bytes.
        let suffix_len: u64 = end_str.parse().ok()?;
        if suffix_len == 0 || size == 0 {
            return Some(RangeRequest::Unsatisfiable);
        }
        let start = size.saturating_sub(suffix_len);
        return Some(RangeRequest::Partial(ByteRange {
            start,
            end: size - 1,
        }));
    }

    let start: u64 = start_str.parse().ok()?;
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse::<u64>().ok()?)
    };
    if end.is_some_and(|end| end < start) {
        return None;
    }
    if start >= size {
        return Some(RangeRequest::Unsatisfiable);
    }

    let last = size - 1;
    let end = end.map_or(last, |end| end.min(last));
    Some(RangeRequest::Partial(ByteRange { start, end }))
}
