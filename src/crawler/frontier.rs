//! Listing page discovery for one namespace
//!
//! Starting from `{base}/{namespace}`, listing pages are walked breadth
//! first. Every page reachable under the namespace root is visited once,
//! keyed by its normalized URL, and the detail links found along the way are
//! collected, deduplicated case-insensitively and sorted.

use crate::codec::Code;
use crate::crawler::parser::{parse_listing, ListingPage};
use crate::extract::code_token_regex;
use crate::fetcher::Fetcher;
use crate::url::{base_str, is_within, namespace_root, normalize_url, same_origin};
use crate::UrlResult;
use std::collections::{BTreeMap, HashSet, VecDeque};
use url::Url;

/// What discovery found for a namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Listing pages successfully fetched, in visit order
    pub listing_pages: Vec<String>,

    /// Unique detail links, ordered by their lowercase form
    pub detail_links: Vec<String>,
}

/// Breadth-first walker over a namespace's listing pages
#[derive(Debug, Clone)]
pub struct Frontier {
    base_url: Url,
    namespace: String,
    root: Url,
    max_pages: Option<usize>,
}

impl Frontier {
    /// Creates a frontier for `namespace` under `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Site root
    /// * `namespace` - Namespace slug; surrounding slashes are ignored
    /// * `max_pages` - Optional cap on listing pages fetched
    pub fn new(base_url: Url, namespace: &str, max_pages: Option<usize>) -> UrlResult<Self> {
        let namespace = namespace.trim().trim_matches('/').to_string();
        let root = normalize_url(&namespace_root(&base_url, &namespace))?;

        Ok(Self {
            base_url,
            namespace,
            root,
            max_pages,
        })
    }

    /// Normalized namespace root URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns true if `url` has the shape `/{namespace}/{Code}` on the site's origin
    ///
    /// Both the namespace and the code are compared case-insensitively. Only
    /// the path is inspected; [`Frontier::discover`] drops any query before
    /// keying the link.
    pub fn is_detail_link(&self, url: &Url) -> bool {
        if !same_origin(&self.base_url, url) {
            return false;
        }

        match url.path().rsplit_once('/') {
            Some((prefix, last)) => {
                prefix.eq_ignore_ascii_case(self.root.path()) && Code::parse(last).is_ok()
            }
            None => false,
        }
    }

    /// Returns true if `url` is a listing page to follow
    fn is_listing_link(&self, url: &Url) -> bool {
        is_within(self.root.as_str(), url.as_str()) && !self.is_detail_link(url)
    }

    /// Detail link synthesized from a code token found in page text
    fn synthesized_link(&self, token: &str) -> Option<Url> {
        let code = Code::parse(token).ok()?;
        let raw = format!("{}/{}", self.root.as_str(), code.as_str());
        normalize_url(&raw).ok()
    }

    /// Splits a parsed listing page into listing links to follow and detail links
    ///
    /// When no anchor on the page is a detail link, the visible text is
    /// scanned for code tokens instead.
    fn classify(&self, page: &ListingPage) -> (Vec<Url>, Vec<Url>) {
        let mut listings = Vec::new();
        let mut details = Vec::new();

        for link in &page.links {
            let Ok(normalized) = normalize_url(link.as_str()) else {
                continue;
            };
            if self.is_detail_link(&normalized) {
                details.push(detail_url(normalized));
            } else if self.is_listing_link(&normalized) {
                listings.push(normalized);
            }
        }

        if details.is_empty() {
            details = code_token_regex()
                .find_iter(&page.visible_text)
                .filter_map(|m| self.synthesized_link(m.as_str()))
                .collect();
            if !details.is_empty() {
                tracing::debug!(
                    "No detail anchors found; synthesized {} link(s) from page text",
                    details.len()
                );
            }
        }

        (listings, details)
    }

    /// Walks the namespace and collects its detail links
    ///
    /// Each listing page is requested once with the site root as referer. A
    /// page that still fails after the fetcher's retries is logged and left
    /// out of `listing_pages`; discovery carries on with the rest of the queue.
    pub async fn discover(&self, fetcher: &dyn Fetcher) -> Discovery {
        let referer = format!("{}/", base_str(&self.base_url));

        let mut queue = VecDeque::from([self.root.clone()]);
        let mut seen: HashSet<String> = HashSet::from([self.root.as_str().to_string()]);
        let mut details: BTreeMap<String, String> = BTreeMap::new();
        let mut listing_pages = Vec::new();

        while let Some(url) = queue.pop_front() {
            let html = match fetcher.get(url.as_str(), Some(&referer)).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Skipping listing page {}: {}", url, e);
                    continue;
                }
            };

            // parsed synchronously so no DOM is held across an await
            let page = parse_listing(&html, &url);
            let (listings, found) = self.classify(&page);

            listing_pages.push(url.to_string());
            tracing::debug!(
                "Listing page {} yielded {} detail link(s)",
                url,
                found.len()
            );

            for link in found {
                details
                    .entry(link.as_str().to_lowercase())
                    .or_insert_with(|| link.to_string());
            }

            if self.max_pages.map_or(false, |cap| listing_pages.len() >= cap) {
                tracing::info!("Reached the listing page cap of {}", listing_pages.len());
                break;
            }

            for link in listings {
                if seen.insert(link.as_str().to_string()) {
                    queue.push_back(link);
                }
            }
        }

        Discovery {
            listing_pages,
            detail_links: details.into_values().collect(),
        }
    }
}

/// A detail page is identified by its path alone
fn detail_url(mut url: Url) -> Url {
    url.set_query(None);
    url
}
