//! Page retrieval
//!
//! Every transport (plain HTTP, the stealth HTTP profile and a rendering
//! browser) sits behind one [`Fetcher`] trait with two operations:
//! - `warmup` primes the session (cookies) before a namespace is crawled
//! - `get` retrieves the markup of a URL, retrying under a shared [`RetryPolicy`]
//!
//! The frontier and the harvester only ever see `Arc<dyn Fetcher>`.

mod browser;
#[cfg(feature = "chrome")]
mod chrome;
mod http;
mod identity;
mod retry;

pub use browser::{BrowserDriver, BrowserFetcher, DriverError, CONSENT_SELECTORS};
#[cfg(feature = "chrome")]
pub use chrome::ChromeDriver;
pub use http::{HttpFetcher, HttpProfile};
pub use identity::{browser_headers, stealth_headers, Identity, FALLBACK_USER_AGENTS};
pub use retry::RetryPolicy;

use crate::config::{Config, FetcherKind};
use crate::url::base_str;
use crate::HarvestError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why a single fetch attempt, or a whole fetch, failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 403: the site refused this client identity
    #[error("blocked with HTTP {status} at {url}")]
    Blocked { url: String, status: u16 },

    /// 429 and the transient 5xx family
    #[error("rate limited with HTTP {status} at {url}")]
    RateLimited { url: String, status: u16 },

    /// Any other non-success status
    #[error("HTTP {status} at {url}")]
    Status { url: String, status: u16 },

    /// Connection, TLS, timeout, body or navigation failure
    #[error("transport error at {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// The URL the failure refers to
    pub fn url(&self) -> &str {
        match self {
            Self::Blocked { url, .. }
            | Self::RateLimited { url, .. }
            | Self::Status { url, .. }
            | Self::Transport { url, .. } => url,
        }
    }

    pub fn transport(url: &str, message: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Maps an HTTP status to the failure it represents, or `None` on success
///
/// # Examples
///
/// ```
/// use dtc_harvest::fetcher::{classify_status, FetchError};
///
/// assert!(classify_status("https://x.test/", 200).is_none());
/// assert!(matches!(
///     classify_status("https://x.test/", 403),
///     Some(FetchError::Blocked { status: 403, .. })
/// ));
/// ```
pub fn classify_status(url: &str, status: u16) -> Option<FetchError> {
    let url = url.to_string();
    match status {
        200..=299 => None,
        403 => Some(FetchError::Blocked { url, status }),
        429 | 500 | 502 | 503 | 504 => Some(FetchError::RateLimited { url, status }),
        _ => Some(FetchError::Status { url, status }),
    }
}

/// A transport able to retrieve rendered page markup
///
/// Implementations take `&self` so one session can be shared behind an
/// `Arc`; any mutable identity state must be synchronized internally.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Site root every request is made against
    fn base_url(&self) -> &Url;

    /// Retrieves `url`, retrying per the fetcher's policy
    async fn get(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError>;

    /// Visits the home page and then the namespace root to collect cookies
    async fn warmup(&self, namespace: &str) -> Result<(), FetchError> {
        let home = format!("{}/", base_str(self.base_url()));
        let root = crate::url::namespace_root(self.base_url(), namespace);

        self.get(&home, None).await?;
        self.get(&root, Some(&home)).await?;
        Ok(())
    }
}

/// Builds the fetcher variant selected in `[fetcher] kind`
///
/// Failing here is the one fatal error of a run: without a transport
/// session nothing can be harvested.
pub async fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, HarvestError> {
    let base_url = config.base_url()?;
    let policy = RetryPolicy::new(config.fetcher.max_attempts, config.harvest.base_delay());

    match config.fetcher.kind {
        FetcherKind::Http => {
            let fetcher = HttpFetcher::new(&config.fetcher, base_url, policy, HttpProfile::Plain)?;
            Ok(Arc::new(fetcher))
        }
        FetcherKind::Stealth => {
            let fetcher =
                HttpFetcher::new(&config.fetcher, base_url, policy, HttpProfile::Stealth)?;
            Ok(Arc::new(fetcher))
        }
        FetcherKind::Browser => build_browser_fetcher(config, base_url, policy).await,
    }
}

#[cfg(feature = "chrome")]
async fn build_browser_fetcher(
    config: &Config,
    base_url: Url,
    policy: RetryPolicy,
) -> Result<Arc<dyn Fetcher>, HarvestError> {
    let driver = ChromeDriver::launch(&config.fetcher).await?;
    Ok(Arc::new(BrowserFetcher::new(
        driver,
        base_url,
        policy,
        config.fetcher.max_scrolls,
    )))
}

#[cfg(not(feature = "chrome"))]
async fn build_browser_fetcher(
    _config: &Config,
    _base_url: Url,
    _policy: RetryPolicy,
) -> Result<Arc<dyn Fetcher>, HarvestError> {
    Err(HarvestError::Transport(
        "the browser fetcher requires building with the `chrome` feature".to_string(),
    ))
}
