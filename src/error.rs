//! Error types for the crawl.
//!
//! Each enum maps to one row of the failure taxonomy: rendering failures are
//! recoverable at the smallest enclosing scope, image failures always degrade
//! to the `No image` sentinel, configuration failures abort before any
//! navigation and output failures are reported after extraction.

use std::time::Duration;
use thiserror::Error;

/// A failure reported by a [`RenderBackend`](crate::backend::RenderBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The operation did not finish within its time bound.
    #[error("{op} timed out after {timeout:?} (selector: {selector})")]
    Timeout {
        op: &'static str,
        selector: String,
        timeout: Duration,
    },

    /// No element matched the selector.
    #[error("no element matches `{selector}`")]
    NotFound { selector: String },

    /// A row handle pointed past the end of its list.
    #[error("row {index} of `{selector}` no longer exists")]
    StaleRow { selector: String, index: usize },

    /// The element exists but does not support the requested interaction.
    #[error("element `{selector}` cannot {action}")]
    Unsupported {
        selector: String,
        action: &'static str,
    },

    /// Navigation to a URL failed.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Any other failure inside the browser engine.
    #[error("browser error: {0}")]
    Browser(String),
}

/// Why an image could not be acquired.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image attribute is empty")]
    EmptyAttribute,

    #[error("image URL `{0}` is not a valid absolute URL")]
    InvalidUrl(String),

    #[error("cannot derive a file name from `{0}`")]
    UnusableName(String),

    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("writing image to disk failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Invalid or missing crawl input. Always fatal, raised before navigation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("search phrase is missing or empty")]
    MissingPhrase,

    #[error("months must be a non-negative integer, got {0}")]
    InvalidMonths(i64),

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("work item {path} is not valid JSON: {source}")]
    WorkItem {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("site profile {path} is not valid YAML: {source}")]
    Profile {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The record table (or JSON dump) could not be written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
