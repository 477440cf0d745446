//! URL pattern utilities
//!
//! These functions work directly on string slices and do not allocate.

// =============================================================================
// Domain Extraction
// =============================================================================

/// Host extracted from a network rule pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedDomain<'a> {
    /// Bare host, empty if the pattern has none
    pub domain: &'a str,
    /// Pattern continues with a path or query after the host
    pub pattern_matches_path: bool,
}

const NO_DOMAIN: ExtractedDomain<'static> = ExtractedDomain {
    domain: "",
    pattern_matches_path: false,
};

/// Prefixes stripped before the host, checked in order.
const HOST_PREFIXES: [&str; 6] = ["||", "|https://", "|http://", "https://", "http://", "|"];

/// Extract the host of a URL pattern such as `||example.org^` or
/// `|https://example.org/path`.
///
/// Returns an empty domain for empty patterns, a bare `/`, a bare `@@`, and patterns
/// that start with a path.
pub fn extract_domain(pattern: &str) -> ExtractedDomain<'_> {
    let mut rest = pattern.strip_prefix("@@").unwrap_or(pattern);

    for prefix in HOST_PREFIXES {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    if rest.is_empty() || rest.starts_with('/') {
        return NO_DOMAIN;
    }

    let end = rest
        .bytes()
        .position(|b| matches!(b, b'/' | b'^' | b'$' | b'*' | b'?' | b'|' | b':'))
        .unwrap_or(rest.len());

    let host = &rest[..end];
    if !is_host(host) {
        return NO_DOMAIN;
    }

    let remainder = &rest[end..];
    ExtractedDomain {
        domain: host,
        pattern_matches_path: !matches!(remainder, "" | "^" | "|" | "^|" | "/" | "$" | "^$"),
    }
}

#[inline]
fn is_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
}
