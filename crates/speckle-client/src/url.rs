//! Locators returned by the service.

/// Resolve a service locator against `base_url`.
///
/// Absolute `http://` and `https://` locators pass through unchanged;
/// anything else is treated as a path on the service. An empty locator
/// yields `None`.
#[must_use]
pub fn abs_url(base_url: &str, locator: &str) -> Option<String> {
    if locator.is_empty() {
        return None;
    }
    let lower = locator.get(..8).unwrap_or(locator).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(locator.to_owned());
    }
    let base = base_url.trim_end_matches('/');
    if locator.starts_with('/') {
        Some(format!("{base}{locator}"))
    } else {
        Some(format!("{base}/{locator}"))
    }
}

/// Append a `t=<millis>` query parameter so a re-processed image under
/// the same locator is fetched again.
#[must_use]
pub fn cache_bust(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={millis}")
}
