//! Rendering browser fetcher
//!
//! Written against a small [`BrowserDriver`] capability so the navigation
//! logic (consent dismissal, lazy-load scrolling, retries) does not depend on
//! any one automation engine.

use super::{FetchError, Fetcher, RetryPolicy};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

/// Accept controls of the common consent managers, tried in order
pub const CONSENT_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "#didomi-notice-agree-button",
    "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
    "button.fc-cta-consent",
    ".qc-cmp2-summary-buttons button[mode='primary']",
    "button[aria-label='Accept all']",
    "button[aria-label='Accept All']",
    "button#accept-all",
    "#accept-cookies",
    ".cookie-consent button.accept",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("browser driver error: {0}")]
pub struct DriverError(pub String);

/// What the fetcher needs from a browser automation engine
///
/// A driver controls a single tab. `frame` indexes the embedded frames of the
/// current document, including cross-origin ones, in an order that stays
/// stable while the document is loaded.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Serialized DOM of the current document
    async fn content(&self) -> Result<String, DriverError>;

    async fn scroll_height(&self) -> Result<u64, DriverError>;

    async fn scroll_to_bottom(&self) -> Result<(), DriverError>;

    async fn frame_count(&self) -> Result<usize, DriverError>;

    /// Clicks the first element matching `selector`; `Ok(false)` if none matched
    async fn click(&self, selector: &str, frame: Option<usize>) -> Result<bool, DriverError>;
}

/// Fetcher that renders pages in a browser before reading their markup
pub struct BrowserFetcher<D> {
    driver: D,
    base_url: Url,
    policy: RetryPolicy,
    max_scrolls: u32,
    settle: Duration,
    // one tab, so navigations must not interleave
    tab: Mutex<()>,
}

impl<D: BrowserDriver> BrowserFetcher<D> {
    pub fn new(driver: D, base_url: Url, policy: RetryPolicy, max_scrolls: u32) -> Self {
        Self {
            driver,
            base_url,
            policy,
            max_scrolls,
            settle: Duration::from_millis(400),
            tab: Mutex::new(()),
        }
    }

    /// Time given to lazy content after each scroll
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Clicks the first matching accept control, main document first, then frames
    ///
    /// Returns true if an overlay was dismissed.
    pub async fn dismiss_consent(&self) -> bool {
        for selector in CONSENT_SELECTORS {
            match self.driver.click(selector, None).await {
                Ok(true) => {
                    tracing::debug!("Dismissed consent overlay via {}", selector);
                    return true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("Consent click {} failed: {}", selector, e),
            }
        }

        let frames = match self.driver.frame_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("Could not count frames: {}", e);
                0
            }
        };

        for frame in 0..frames {
            for selector in CONSENT_SELECTORS {
                if let Ok(true) = self.driver.click(selector, Some(frame)).await {
                    tracing::debug!("Dismissed consent overlay in frame {} via {}", frame, selector);
                    return true;
                }
            }
        }

        false
    }

    /// Scrolls until the page height stops changing or the ceiling is hit
    ///
    /// Returns the number of scrolls performed.
    pub async fn load_lazy_content(&self) -> Result<u32, DriverError> {
        let mut last_height = self.driver.scroll_height().await?;
        let mut scrolls = 0;

        while scrolls < self.max_scrolls {
            self.driver.scroll_to_bottom().await?;
            scrolls += 1;
            if !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }

            let height = self.driver.scroll_height().await?;
            if height == last_height {
                break;
            }
            last_height = height;
        }

        Ok(scrolls)
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let _tab = self.tab.lock().await;

        self.driver
            .goto(url)
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        self.dismiss_consent().await;
        self.load_lazy_content()
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        self.driver
            .content()
            .await
            .map_err(|e| FetchError::transport(url, e))
    }
}

#[async_trait]
impl<D: BrowserDriver> Fetcher for BrowserFetcher<D> {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Navigates to `url`; the browser sets its own referer
    async fn get(&self, url: &str, _referer: Option<&str>) -> Result<String, FetchError> {
        tracing::debug!("Rendering {}", url);
        self.policy.run(url, || {}, |_| self.attempt(url)).await
    }
}
