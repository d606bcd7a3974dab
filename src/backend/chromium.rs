//! Chromium-based backend using chromiumoxide.

use super::{RenderBackend, RowHandle};
use crate::error::BackendError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, instrument, warn};

const VISIBILITY_POLL: Duration = Duration::from_millis(250);

const IS_VISIBLE_JS: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    const s = window.getComputedStyle(this); \
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
}";

/// Launch options for [`ChromiumBackend::launch`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Show the browser window instead of running headless.
    pub headful: bool,
    /// Explicit browser binary; chromiumoxide searches the usual locations otherwise.
    pub executable: Option<PathBuf>,
    pub navigation_timeout: Duration,
    /// Bound for every non-navigation operation.
    pub operation_timeout: Duration,
}

/// One Chromium tab driven over the DevTools protocol.
pub struct ChromiumBackend {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    navigation_timeout: Duration,
    operation_timeout: Duration,
}

impl ChromiumBackend {
    /// Launch a browser and open a blank tab.
    #[instrument(level = "info", skip_all, fields(headful = options.headful))]
    pub async fn launch(options: ChromiumOptions) -> Result<Self, BackendError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .window_size(1920, 1080)
            .request_timeout(options.navigation_timeout);
        if options.headful {
            builder = builder.with_head();
        }
        if let Some(path) = options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BackendError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BackendError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::Browser(format!("failed to open tab: {e}")))?;

        info!("Chromium launched");
        Ok(Self {
            browser,
            handler,
            page,
            navigation_timeout: options.navigation_timeout,
            operation_timeout: options.operation_timeout,
        })
    }

    /// Close the browser and stop the protocol handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Closing Chromium failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        info!("Chromium closed");
    }

    async fn bounded<T, F>(&self, op: &'static str, selector: &str, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, CdpError>>,
    {
        match timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(BackendError::Browser(format!("{op} on `{selector}`: {e}"))),
            Err(_) => Err(BackendError::Timeout {
                op,
                selector: selector.to_string(),
                timeout: self.operation_timeout,
            }),
        }
    }

    async fn element(&self, op: &'static str, selector: &str) -> Result<Element, BackendError> {
        let found = self
            .bounded(op, selector, self.page.find_elements(selector))
            .await?;
        first_or_not_found(found, selector)
    }

    async fn row_element(
        &self,
        op: &'static str,
        row: &RowHandle,
        selector: &str,
    ) -> Result<Element, BackendError> {
        let rows = self
            .bounded(op, row.list_selector(), self.page.find_elements(row.list_selector()))
            .await?;
        let row_el = rows
            .into_iter()
            .nth(row.index())
            .ok_or_else(|| BackendError::StaleRow {
                selector: row.list_selector().to_string(),
                index: row.index(),
            })?;
        let found = self
            .bounded(op, selector, row_el.find_elements(selector))
            .await?;
        first_or_not_found(found, selector)
    }

    async fn is_visible(&self, selector: &str) -> bool {
        let Ok(Ok(el)) = timeout(VISIBILITY_POLL, self.page.find_element(selector)).await else {
            return false;
        };
        match timeout(VISIBILITY_POLL, el.call_js_fn(IS_VISIBLE_JS, false)).await {
            Ok(Ok(ret)) => ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false),
            _ => false,
        }
    }
}

fn first_or_not_found(found: Vec<Element>, selector: &str) -> Result<Element, BackendError> {
    found
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound {
            selector: selector.to_string(),
        })
}

impl RenderBackend for ChromiumBackend {
    #[instrument(level = "info", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = timeout(self.navigation_timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Page loaded");
                Ok(())
            }
            Ok(Err(e)) => Err(BackendError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BackendError::Timeout {
                op: "navigate",
                selector: url.to_string(),
                timeout: self.navigation_timeout,
            }),
        }
    }

    async fn wait_until_visible(
        &mut self,
        selector: &str,
        wait: Duration,
    ) -> Result<(), BackendError> {
        let deadline = Instant::now() + wait;
        loop {
            if self.is_visible(selector).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BackendError::Timeout {
                    op: "wait_until_visible",
                    selector: selector.to_string(),
                    timeout: wait,
                });
            }
            sleep(VISIBILITY_POLL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), BackendError> {
        let el = self.element("click", selector).await?;
        self.bounded("click", selector, async { el.click().await.map(|_| ()) })
            .await
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BackendError> {
        let el = self.element("type_text", selector).await?;
        self.bounded("type_text", selector, async {
            el.click().await?;
            el.type_str(text).await.map(|_| ())
        })
        .await
    }

    async fn get_text(&mut self, selector: &str) -> Result<String, BackendError> {
        let el = self.element("get_text", selector).await?;
        let text = self.bounded("get_text", selector, el.inner_text()).await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn get_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let el = self.element("get_attribute", selector).await?;
        self.bounded("get_attribute", selector, el.attribute(name))
            .await
    }

    async fn list_elements(&mut self, selector: &str) -> Result<Vec<RowHandle>, BackendError> {
        let elements = self
            .bounded("list_elements", selector, self.page.find_elements(selector))
            .await?;
        Ok((0..elements.len())
            .map(|i| RowHandle::new(selector, i))
            .collect())
    }

    async fn select_by_label(&mut self, selector: &str, label: &str) -> Result<(), BackendError> {
        let el = self.element("select_by_label", selector).await?;
        let label_js = serde_json::to_string(label)
            .map_err(|e| BackendError::Browser(e.to_string()))?;
        let script = format!(
            "function() {{ \
                if (!this.options) return null; \
                const label = {label_js}; \
                for (const o of this.options) {{ \
                    if (o.label.trim() === label || o.text.trim() === label) {{ \
                        this.value = o.value; \
                        this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                        return true; \
                    }} \
                }} \
                return false; \
            }}"
        );
        let ret = self
            .bounded("select_by_label", selector, el.call_js_fn(script, false))
            .await?;
        match ret.result.value.and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            Some(false) => Err(BackendError::NotFound {
                selector: format!("{selector} option[label={label}]"),
            }),
            None => Err(BackendError::Unsupported {
                selector: selector.to_string(),
                action: "select an option",
            }),
        }
    }

    async fn row_text(&mut self, row: &RowHandle, selector: &str) -> Result<String, BackendError> {
        let el = self.row_element("row_text", row, selector).await?;
        let text = self.bounded("row_text", selector, el.inner_text()).await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn row_attribute(
        &mut self,
        row: &RowHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let el = self.row_element("row_attribute", row, selector).await?;
        self.bounded("row_attribute", selector, el.attribute(name))
            .await
    }

    async fn row_click(&mut self, row: &RowHandle, selector: &str) -> Result<(), BackendError> {
        let el = self.row_element("row_click", row, selector).await?;
        self.bounded("row_click", selector, async { el.click().await.map(|_| ()) })
            .await
    }
}
