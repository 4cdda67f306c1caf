//! URL handling
//!
//! Normalization used as the crawl's dedup key, and the namespace scoping
//! helpers the frontier relies on.

mod normalize;

pub use normalize::normalize_url;

use ::url::Url;

/// Builds the namespace root, `{base}/{namespace}`
///
/// # Examples
///
/// ```
/// use dtc_harvest::url::namespace_root;
///
/// let base = url::Url::parse("https://www.example.com/").unwrap();
/// assert_eq!(namespace_root(&base, "Land-Rover"), "https://www.example.com/Land-Rover");
/// ```
pub fn namespace_root(base: &Url, namespace: &str) -> String {
    format!("{}/{}", base_str(base), namespace.trim_matches('/'))
}

/// The base URL without its trailing slash
pub fn base_str(base: &Url) -> &str {
    base.as_str().trim_end_matches('/')
}

/// Returns true if `candidate` normalizes to a URL prefixed by the normalized `root`
///
/// Unparseable URLs are never within a root.
pub fn is_within(root: &str, candidate: &str) -> bool {
    match (normalize_url(root), normalize_url(candidate)) {
        (Ok(root), Ok(candidate)) => candidate.as_str().starts_with(root.as_str()),
        _ => false,
    }
}

/// Returns true if both URLs point at the same scheme, host and port
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.example.com/").unwrap()
    }

    #[test]
    fn test_namespace_root_trims_slashes() {
        assert_eq!(
            namespace_root(&base(), "/Land-Rover/"),
            "https://www.example.com/Land-Rover"
        );
    }

    #[test]
    fn test_is_within_pagination() {
        let root = "https://www.example.com/Land-Rover";
        assert!(is_within(root, "https://www.example.com/Land-Rover?page=2"));
        assert!(is_within(root, "https://www.example.com/Land-Rover/"));
        assert!(is_within(root, "https://www.example.com/Land-Rover/page/3"));
    }

    #[test]
    fn test_is_within_rejects_other_namespaces() {
        let root = "https://www.example.com/Land-Rover";
        assert!(!is_within(root, "https://www.example.com/Jaguar"));
        assert!(!is_within(root, "https://www.example.com/"));
        assert!(!is_within(root, "https://other.com/Land-Rover"));
        assert!(!is_within(root, "mailto:someone@example.com"));
    }

    #[test]
    fn test_same_origin() {
        let other = Url::parse("https://www.example.com/Jaguar").unwrap();
        assert!(same_origin(&base(), &other));
        let elsewhere = Url::parse("http://www.example.com/").unwrap();
        assert!(!same_origin(&base(), &elsewhere));
    }
}
