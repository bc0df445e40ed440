//! Request path normalization.
//!
//! # Responsibilities
//! - Drop query string and fragment
//! - Strip the configured base prefix
//! - Apply the trailing-slash rule shared by patterns and paths
//! - Split a matched path into percent-decoded segments

use std::borrow::Cow;

/// Cut the path at the first '?' or '#'.
pub fn strip_query(raw: &str) -> &str {
    match raw.find(|c: char| c == '?' || c == '#') {
        Some(end) => &raw[..end],
        None => raw,
    }
}

/// Remove trailing slashes, except from the root path "/".
pub fn trim_trailing_slash(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/')
    }
}

/// Strip `base` from the front of `path`.
///
/// The base only matches on whole segments. A path outside the base is
/// returned unchanged.
pub fn strip_base<'a>(path: &'a str, base: Option<&str>) -> Cow<'a, str> {
    let base = match base.map(|b| b.trim_matches('/')) {
        Some(b) if !b.is_empty() => b,
        _ => return Cow::Borrowed(path),
    };

    let relative = path.trim_start_matches('/');
    match relative.strip_prefix(base) {
        Some("") => Cow::Borrowed("/"),
        Some(rest) if rest.starts_with('/') => Cow::Owned(format!("/{}", rest.trim_start_matches('/'))),
        _ => Cow::Borrowed(path),
    }
}

/// Split a path into segments, dropping empty leading and trailing pieces.
///
/// Each segment is percent-decoded on its own so an encoded '/' never
/// becomes a separator.
pub fn split_segments(path: &str) -> Vec<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed.split('/').map(decode_segment).collect()
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned(),
    }
}
