//! Chromium driver over the DevTools protocol

use super::browser::{BrowserDriver, DriverError};
use super::identity::FALLBACK_USER_AGENTS;
use crate::config::FetcherConfig;
use crate::HarvestError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::FrameId;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// A single Chromium tab driven through chromiumoxide
pub struct ChromeDriver {
    // kept alive for the lifetime of the page
    _browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeDriver {
    /// Launches Chromium and opens the tab used for the whole session
    pub async fn launch(config: &FetcherConfig) -> Result<Self, HarvestError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            // keeps cross-origin frames in the page's process so their
            // execution contexts are reported to this session
            .arg("--disable-features=IsolateOrigins,site-per-process");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(proxy) = &config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        let browser_config = builder.build().map_err(HarvestError::Transport)?;

        let (browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarvestError::Transport(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Transport(e.to_string()))?;

        let user_agent = config
            .user_agent
            .as_deref()
            .unwrap_or(FALLBACK_USER_AGENTS[0]);
        page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| HarvestError::Transport(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            page,
            handler,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, DriverError> {
        self.page
            .evaluate(script)
            .await
            .map_err(driver_error)?
            .into_value()
            .map_err(driver_error)
    }

    /// Frames other than the main frame, ordered by frame id
    async fn child_frames(&self) -> Result<Vec<FrameId>, DriverError> {
        let main = self.page.mainframe().await.map_err(driver_error)?;
        let frames = self.page.frames().await.map_err(driver_error)?;
        Ok(child_frames(frames, main.as_ref()))
    }

    /// Evaluates `script` inside the execution context of a child frame
    ///
    /// Returns `None` if the frame is gone or has no context yet.
    async fn eval_in_frame(&self, index: usize, script: &str) -> Result<Option<bool>, DriverError> {
        let Some(frame) = self.child_frames().await?.into_iter().nth(index) else {
            return Ok(None);
        };
        let Some(context) = self
            .page
            .frame_execution_context(frame)
            .await
            .map_err(driver_error)?
        else {
            return Ok(None);
        };

        let params = EvaluateParams::builder()
            .expression(script)
            .context_id(context)
            .return_by_value(true)
            .build()
            .map_err(DriverError)?;
        let value = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(driver_error)?
            .into_value()
            .map_err(driver_error)?;
        Ok(Some(value))
    }
}

fn child_frames(mut frames: Vec<FrameId>, main: Option<&FrameId>) -> Vec<FrameId> {
    frames.retain(|frame| Some(frame) != main);
    frames.sort_by(|a, b| a.inner().cmp(b.inner()));
    frames
}

/// Script that clicks the first match of `selector` in the current document
fn click_script(selector: &str) -> String {
    format!(
        "(function() {{ const el = document.querySelector({}); if (!el) return false; \
         el.click(); return true; }})()",
        js_string(selector)
    )
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn driver_error(e: impl std::fmt::Display) -> DriverError {
    DriverError(e.to_string())
}

/// JavaScript string literal for `value`
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.page.goto(url).await.map_err(driver_error)?;
        self.page.wait_for_navigation().await.map_err(driver_error)?;
        Ok(())
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.page.content().await.map_err(driver_error)
    }

    async fn scroll_height(&self) -> Result<u64, DriverError> {
        let height: f64 = self
            .eval("document.body ? document.body.scrollHeight : 0")
            .await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&self) -> Result<(), DriverError> {
        let _: bool = self
            .eval("window.scrollTo(0, document.body.scrollHeight); true")
            .await?;
        Ok(())
    }

    async fn frame_count(&self) -> Result<usize, DriverError> {
        Ok(self.child_frames().await?.len())
    }

    async fn click(&self, selector: &str, frame: Option<usize>) -> Result<bool, DriverError> {
        let script = click_script(selector);
        match frame {
            None => self.eval(&script).await,
            Some(index) => Ok(self.eval_in_frame(index, &script).await?.unwrap_or(false)),
        }
    }
}
