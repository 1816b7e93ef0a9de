//! URL → output filename mapping

use url::Url;

/// Name used when a URL has no usable path
pub const ROOT_NAME: &str = "index";

/// Extension of every output file
pub const EXTENSION: &str = ".md";

/// Derives a filesystem-safe filename for a URL
///
/// Only the path is used; query and fragment are ignored. A leading
/// `strip_prefix` (e.g. `/docs/`) is removed once, surrounding slashes are
/// trimmed, and every character outside `[A-Za-z0-9_.-]` (plus non-ASCII
/// letters and digits) becomes `_`. An empty result, or a URL that does not
/// parse, maps to `index.md`.
///
/// # Examples
///
/// ```
/// use doc_digest::store::derive_filename;
///
/// assert_eq!(derive_filename("https://x.com/docs/foo", "/docs/"), "foo.md");
/// assert_eq!(derive_filename("https://x.com/docs/a/b", "/docs/"), "a_b.md");
/// assert_eq!(derive_filename("https://x.com/", "/docs/"), "index.md");
/// ```
pub fn derive_filename(url: &str, strip_prefix: &str) -> String {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_default();

    let stripped = if strip_prefix.is_empty() {
        path.as_str()
    } else {
        path.strip_prefix(strip_prefix).unwrap_or(&path)
    };

    let slug = stripped.trim_matches('/');
    let slug = if slug.is_empty() { ROOT_NAME } else { slug };

    let safe: String = slug
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();

    format!("{safe}{EXTENSION}")
}

fn is_safe(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}
