//! Data models for crawl input and extracted articles.
//!
//! - [`SearchQuery`]: validated crawl input, read-only once the crawl starts
//! - [`ArticleRecord`]: one extracted search result
//! - [`ImageFile`]: downloaded image path or the `No image` sentinel
//! - [`CrawlOutcome`]: the ordered records plus how the crawl ended

use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Placeholder written wherever an image could not be acquired.
pub const NO_IMAGE: &str = "No image";

/// What to search for and how far back to keep results.
///
/// Built once from caller input through [`SearchQuery::new`], which rejects an
/// empty phrase. The crawl only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    phrase: String,
    category: Option<String>,
    window_months: u32,
}

impl SearchQuery {
    /// Validate caller input into a query.
    ///
    /// The phrase is trimmed and must be non-empty. A blank category is treated
    /// as "no category filter".
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingPhrase`] when the phrase is empty after trimming.
    pub fn new(
        phrase: impl Into<String>,
        category: Option<String>,
        window_months: u32,
    ) -> Result<Self, ConfigError> {
        let phrase = phrase.into().trim().to_string();
        if phrase.is_empty() {
            return Err(ConfigError::MissingPhrase);
        }
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Self {
            phrase,
            category,
            window_months,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn window_months(&self) -> u32 {
        self.window_months
    }
}

/// The image column of an [`ArticleRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageFile {
    /// The image was written to this path.
    Downloaded(PathBuf),
    /// No image could be acquired for the article.
    NoImage,
}

impl fmt::Display for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFile::Downloaded(path) => write!(f, "{}", path.display()),
            ImageFile::NoImage => f.write_str(NO_IMAGE),
        }
    }
}

impl Serialize for ImageFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One search result, as extracted from the results page.
///
/// Records are never mutated after creation and are kept in the order the
/// site presented them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    /// Headline text.
    pub title: String,
    /// Timestamp text exactly as shown on the page.
    pub raw_date: String,
    /// Teaser text below the headline.
    pub description: String,
    /// Downloaded image location, or the `No image` sentinel.
    pub image_file: ImageFile,
    /// Case-insensitive occurrences of the search phrase in title and description.
    pub match_count: usize,
    /// Whether the description mentions an amount of money.
    pub has_monetary_value: bool,
}

/// How a crawl reached its end. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An article older than the retention window was reached.
    Stopped,
    /// There were no more pages (or they could not be read).
    Exhausted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Stopped => f.write_str("stopped"),
            Termination::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Result of a whole crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Records in site presentation order.
    pub records: Vec<ArticleRecord>,
    pub termination: Termination,
    /// Number of result pages that were visited.
    pub pages_visited: usize,
    /// First publication date the crawl kept.
    pub cutoff: NaiveDate,
}
