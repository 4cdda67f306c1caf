//! Listing page parsing
//!
//! This module extracts what the frontier needs from a listing page:
//! - every followable link, resolved to an absolute URL
//! - the visible body text, used when the page has no usable detail anchors

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from a listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Absolute http(s) URLs of every `<a href>` in document order
    pub links: Vec<Url>,

    /// Body text outside `script`, `style`, `noscript` and `template`
    pub visible_text: String,
}

/// Tags whose text never renders
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses a listing page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - URL of the page, used to resolve relative links
///
/// # Example
///
/// ```
/// use dtc_harvest::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<body><a href="/Land-Rover/P0300-00">P0300-00</a><script>var x = 1;</script></body>"#;
/// let page_url = Url::parse("https://example.com/Land-Rover").unwrap();
/// let page = parse_listing(html, &page_url);
/// assert_eq!(page.links[0].as_str(), "https://example.com/Land-Rover/P0300-00");
/// assert!(!page.visible_text.contains("var x"));
/// ```
pub fn parse_listing(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);

    ListingPage {
        links: extract_links(&document, page_url),
        visible_text: extract_visible_text(&document),
    }
}

fn extract_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, page_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

fn extract_visible_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| HIDDEN_TAGS.contains(&el.name()))
        });
        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }
    text
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = page_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}
