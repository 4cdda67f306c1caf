//! Client identity: user-agent rotation and browser-like request headers

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Realistic desktop browser user agents rotated through on 403s
pub const FALLBACK_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
];

/// The user agent presented to the site
///
/// A configured custom agent is always used and never rotated. Otherwise the
/// fallback pool is walked round-robin. The index is atomic so one identity
/// can be shared by concurrent requests.
#[derive(Debug, Default)]
pub struct Identity {
    custom: Option<String>,
    index: AtomicUsize,
}

impl Identity {
    pub fn new(custom: Option<String>) -> Self {
        Self {
            custom: custom.filter(|ua| !ua.trim().is_empty()),
            index: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> &str {
        match &self.custom {
            Some(ua) => ua,
            None => {
                let index = self.index.load(Ordering::Relaxed) % FALLBACK_USER_AGENTS.len();
                FALLBACK_USER_AGENTS[index]
            }
        }
    }

    /// Moves to the next agent in the pool; no-op for a custom agent
    pub fn rotate(&self) {
        if self.custom.is_none() {
            self.index.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }
}

/// Headers a desktop browser sends for a top-level navigation
///
/// Accept-Encoding is left to the HTTP client, which only advertises the
/// encodings it can decode.
pub fn browser_headers(user_agent: &str, referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("user-agent", user_agent),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
        ("accept-language", "en-GB,en;q=0.9"),
        ("upgrade-insecure-requests", "1"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
    ];
    for (name, value) in pairs {
        insert(&mut headers, name, value);
    }
    if let Some(referer) = referer {
        insert(&mut headers, "referer", referer);
    }
    headers
}

/// Client-hint and fetch-metadata headers added by the stealth profile
pub fn stealth_headers(user_agent: &str, referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let platform = if user_agent.contains("Windows") {
        "\"Windows\""
    } else if user_agent.contains("Macintosh") {
        "\"macOS\""
    } else {
        "\"Linux\""
    };

    if user_agent.contains("Chrome/") {
        let major = user_agent
            .split("Chrome/")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .unwrap_or("126");
        let brands = format!(
            "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"{major}\", \"Google Chrome\";v=\"{major}\""
        );
        insert(&mut headers, "sec-ch-ua", &brands);
        insert(&mut headers, "sec-ch-ua-mobile", "?0");
        insert(&mut headers, "sec-ch-ua-platform", platform);
    }

    insert(&mut headers, "sec-fetch-dest", "document");
    insert(&mut headers, "sec-fetch-mode", "navigate");
    insert(&mut headers, "sec-fetch-user", "?1");
    let site = if referer.is_some() { "same-origin" } else { "none" };
    insert(&mut headers, "sec-fetch-site", site);
    headers
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => tracing::debug!("Skipping header {} with invalid value", name),
    }
}
