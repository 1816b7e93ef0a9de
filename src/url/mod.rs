//! URL handling module for Doc-Digest
//!
//! This module provides URL normalization and glob matching used by the page
//! source to decide which documentation pages are in scope.

mod matcher;
mod normalize;

pub use matcher::matches_glob;
pub use normalize::normalize_url;

use url::Url;

/// Returns true if two URLs share scheme, host and port
///
/// Link following never leaves the host the seed was on.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Returns true if a URL passes the optional scope pattern
pub fn in_scope(pattern: Option<&str>, url: &Url) -> bool {
    pattern.map_or(true, |p| matches_glob(p, url.as_str()))
}
