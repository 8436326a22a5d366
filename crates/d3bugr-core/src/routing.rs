//! URL helpers for building upstream targets.
//!
//! Registry addresses never end in `/`; these helpers keep exactly one
//! separator between the address and whatever follows it.

/// Append a forwarding sub-path to a base address.
///
/// The sub-path is kept verbatim apart from leading slashes, so nested
/// segments survive intact.
///
/// ```
/// # use d3bugr_core::routing::target_url;
/// assert_eq!(
///     target_url("http://nuclei:8000", "scan/templates/cves"),
///     "http://nuclei:8000/scan/templates/cves"
/// );
/// assert_eq!(target_url("http://nuclei:8000/", "/scan"), "http://nuclei:8000/scan");
/// assert_eq!(target_url("http://nuclei:8000", ""), "http://nuclei:8000/");
/// ```
pub fn target_url(base: &str, sub_path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        sub_path.trim_start_matches('/')
    )
}

/// Build the health probe URL for a service.
///
/// ```
/// # use d3bugr_core::routing::health_url;
/// assert_eq!(health_url("http://httpx:8000", "/health"), "http://httpx:8000/health");
/// assert_eq!(health_url("http://httpx:8000", "healthz"), "http://httpx:8000/healthz");
/// ```
pub fn health_url(base: &str, health_path: &str) -> String {
    target_url(base, health_path)
}
