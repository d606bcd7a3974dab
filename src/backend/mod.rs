//! Rendering backend abstraction.
//!
//! The crawl never talks to a browser directly. It drives a [`RenderBackend`]:
//! a fixed set of blocking-style page operations, each bounded by a timeout
//! inside the implementation. Failures come back as [`BackendError`] values
//! and the caller decides at which scope to absorb them.
//!
//! # Implementations
//!
//! | Backend | Module | Notes |
//! |---------|--------|-------|
//! | Chromium | [`chromium`] | Headless Chromium over CDP |
//! | Snapshot | `snapshot` | In-memory HTML pages, test builds only |

pub mod chromium;
#[cfg(test)]
pub mod snapshot;

use crate::error::BackendError;
use std::time::Duration;

/// Opaque reference to one entry of a rendered list.
///
/// A handle is the list selector plus the entry's position, so it stays valid
/// only while the page that produced it is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle {
    list_selector: String,
    index: usize,
}

impl RowHandle {
    pub fn new(list_selector: impl Into<String>, index: usize) -> Self {
        Self {
            list_selector: list_selector.into(),
            index,
        }
    }

    pub fn list_selector(&self) -> &str {
        &self.list_selector
    }

    /// Zero-based position within the list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Page operations the crawl needs from a browser.
///
/// Selectors are CSS selectors. Row-scoped operations resolve `selector`
/// inside the row's element.
pub trait RenderBackend {
    /// Load `url` in the current tab.
    async fn navigate(&mut self, url: &str) -> Result<(), BackendError>;

    /// Wait until an element matching `selector` is present and visible.
    async fn wait_until_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BackendError>;

    async fn click(&mut self, selector: &str) -> Result<(), BackendError>;

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BackendError>;

    /// Rendered text of the first element matching `selector`.
    async fn get_text(&mut self, selector: &str) -> Result<String, BackendError>;

    /// Attribute value of the first element matching `selector`, `None` when
    /// the element exists but lacks the attribute.
    async fn get_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError>;

    /// Handles for every element matching `selector`, in document order.
    async fn list_elements(&mut self, selector: &str) -> Result<Vec<RowHandle>, BackendError>;

    /// Pick the `<option>` whose visible label equals `label`.
    async fn select_by_label(&mut self, selector: &str, label: &str) -> Result<(), BackendError>;

    async fn row_text(&mut self, row: &RowHandle, selector: &str) -> Result<String, BackendError>;

    async fn row_attribute(
        &mut self,
        row: &RowHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError>;

    async fn row_click(&mut self, row: &RowHandle, selector: &str) -> Result<(), BackendError>;
}
