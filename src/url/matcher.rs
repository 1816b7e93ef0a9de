/// Checks if a URL matches a `*` glob pattern
///
/// `*` matches any run of characters (including none and including `/`);
/// every other character matches itself. The whole URL has to match, so a
/// pattern that should match anywhere needs a leading and trailing `*`.
///
/// # Examples
///
/// ```
/// use doc_digest::url::matches_glob;
///
/// assert!(matches_glob("*docs/*", "https://bits-ui.com/docs/intro"));
/// assert!(matches_glob("https://bits-ui.com/*", "https://bits-ui.com/"));
/// assert!(!matches_glob("*docs/*", "https://bits-ui.com/blog/intro"));
/// ```
pub fn matches_glob(pattern: &str, candidate: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    // No wildcard at all: exact match
    if parts.len() == 1 {
        return pattern == candidate;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];

    if !candidate.starts_with(first) {
        return false;
    }
    let mut rest = &candidate[first.len()..];

    for middle in &parts[1..parts.len() - 1] {
        if middle.is_empty() {
            continue;
        }
        match rest.find(middle) {
            Some(index) => rest = &rest[index + middle.len()..],
            None => return false,
        }
    }

    rest.len() >= last.len() && rest.ends_with(last)
}
