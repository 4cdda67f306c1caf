//! HTTP fetcher built on reqwest
//!
//! One client per namespace run: the cookie jar and identity index live as
//! long as the fetcher does, which is what the warmup relies on.

use super::identity::{browser_headers, stealth_headers, Identity};
use super::{classify_status, FetchError, Fetcher, RetryPolicy};
use crate::config::FetcherConfig;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How the HTTP client presents itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpProfile {
    /// Browser-like headers over the default TLS stack
    Plain,
    /// rustls with HTTP/2 negotiation plus client-hint and fetch-metadata
    /// headers, closer to what a current desktop browser sends
    Stealth,
}

/// Fetcher speaking plain HTTP(S)
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    identity: Identity,
    policy: RetryPolicy,
    profile: HttpProfile,
}

impl HttpFetcher {
    /// Builds the client for one namespace session
    ///
    /// # Arguments
    ///
    /// * `config` - Transport settings (timeout, proxy, cookies, user agent)
    /// * `base_url` - Site root; pre-supplied cookies are scoped to it
    /// * `policy` - Retry policy applied to every `get`
    /// * `profile` - Plain or stealth presentation
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to fetch
    /// * `Err(HarvestError)` - The client could not be built (bad proxy, TLS init)
    pub fn new(
        config: &FetcherConfig,
        base_url: Url,
        policy: RetryPolicy,
        profile: HttpProfile,
    ) -> Result<Self, HarvestError> {
        let jar = Arc::new(Jar::default());
        if let Some(cookies) = &config.cookies {
            for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &base_url);
            }
        }

        let mut builder = Client::builder()
            .cookie_provider(jar)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true);

        if profile == HttpProfile::Stealth {
            builder = builder.use_rustls_tls();
        }

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            identity: Identity::new(config.user_agent.clone()),
            policy,
            profile,
        })
    }

    pub fn profile(&self) -> HttpProfile {
        self.profile
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn attempt(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError> {
        let user_agent = self.identity.current();
        let mut headers = browser_headers(user_agent, referer);
        if self.profile == HttpProfile::Stealth {
            headers.extend(stealth_headers(user_agent, referer));
        }

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status().as_u16();
        if let Some(error) = classify_status(url, status) {
            return Err(error);
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, e))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError> {
        tracing::debug!("GET {} (referer: {:?})", url, referer);
        self.policy
            .run(url, || self.identity.rotate(), |_| self.attempt(url, referer))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.example.com").unwrap()
    }

    #[test]
    fn test_build_with_cookies_and_proxy() {
        let config = FetcherConfig {
            cookies: Some("cf_clearance=abc; consent=yes;".to_string()),
            proxy: Some("http://127.0.0.1:8080".to_string()),
            ..FetcherConfig::default()
        };
        let fetcher =
            HttpFetcher::new(&config, base(), RetryPolicy::default(), HttpProfile::Stealth)
                .unwrap();
        assert_eq!(fetcher.profile(), HttpProfile::Stealth);
        assert!(!fetcher.identity().is_custom());
    }

    #[test]
    fn test_custom_agent_is_kept() {
        let config = FetcherConfig {
            user_agent: Some("Harvester/0.1".to_string()),
            ..FetcherConfig::default()
        };
        let fetcher =
            HttpFetcher::new(&config, base(), RetryPolicy::default(), HttpProfile::Plain).unwrap();
        assert_eq!(fetcher.identity().current(), "Harvester/0.1");
    }
}
