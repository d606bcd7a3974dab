//! Crawl configuration: the site profile and the work item.
//!
//! The [`SiteProfile`] describes *where* to crawl (base URL, CSS selectors,
//! timeouts) and is read from an optional YAML file. The [`WorkItem`] describes
//! *what* to crawl (phrase, category, months) and is read from an optional
//! JSON file, either wrapped in a `payload` object or flat:
//!
//! ```json
//! { "payload": { "search_phrase": "Nasdaq", "news_category": "Business", "months": 3 } }
//! ```

use crate::error::ConfigError;
use crate::models::SearchQuery;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// CSS selectors for every element the crawl touches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub search_button: String,
    pub search_input: String,
    pub search_submit: String,
    pub sort_select: String,
    pub category_see_all: String,
    /// One entry per category checkbox, taken from the first filter menu only.
    pub category_options: String,
    /// Label text inside a category entry.
    pub category_label: String,
    /// Checkbox inside a category entry.
    pub category_input: String,
    pub page_counts: String,
    pub next_page_link: String,
    /// One entry per search result.
    pub result_rows: String,
    pub row_title: String,
    pub row_date: String,
    pub row_description: String,
    pub row_image: String,
    pub row_image_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_button: "button[data-element='search-button']".to_string(),
            search_input: "input[data-element='search-form-input']".to_string(),
            search_submit: "button[data-element='search-submit-button']".to_string(),
            sort_select: "select.select-input".to_string(),
            category_see_all: "span.see-all-text".to_string(),
            category_options: "ul.search-filter-menu:first-of-type li".to_string(),
            category_label: "span".to_string(),
            category_input: "input".to_string(),
            page_counts: "div.search-results-module-page-counts".to_string(),
            next_page_link: "div.search-results-module-next-page a".to_string(),
            result_rows: "ul.search-results-module-results-menu > li".to_string(),
            row_title: "h3".to_string(),
            row_date: "p.promo-timestamp".to_string(),
            row_description: "p.promo-description".to_string(),
            row_image: "source[type='image/webp']".to_string(),
            row_image_attribute: "srcset".to_string(),
        }
    }
}

/// Time bounds, in seconds (settle delay in milliseconds).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_secs: u64,
    /// Waiting for the search button and the result list to render.
    pub element_wait_secs: u64,
    /// Any single element read or interaction.
    pub operation_secs: u64,
    pub image_download_secs: u64,
    /// Pause after sorting/filtering so the list can re-render.
    pub settle_millis: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_secs: 40,
            element_wait_secs: 20,
            operation_secs: 10,
            image_download_secs: 30,
            settle_millis: 2000,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn operation(&self) -> Duration {
        Duration::from_secs(self.operation_secs)
    }

    pub fn image_download(&self) -> Duration {
        Duration::from_secs(self.image_download_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

/// Everything site-specific about a crawl.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub base_url: String,
    /// Visible label of the newest-first sort option.
    pub newest_label: String,
    pub selectors: Selectors,
    pub timeouts: Timeouts,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com/".to_string(),
            newest_label: "Newest".to_string(),
            selectors: Selectors::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl SiteProfile {
    /// Parse a YAML profile. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Profile {
            path: path.to_string(),
            source,
        })
    }

    /// Load the profile at `path`, or the built-in profile when `path` is `None`.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let profile = Self::from_yaml(&yaml, path)?;
        info!(base_url = %profile.base_url, "Loaded site profile");
        Ok(profile)
    }
}

/// Search parameters as stored in a work item. Every field is optional here;
/// validation happens in [`WorkItem::into_query`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WorkItem {
    pub search_phrase: Option<String>,
    pub news_category: Option<String>,
    pub months: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkItemFile {
    Wrapped { payload: WorkItem },
    Flat(WorkItem),
}

impl WorkItem {
    /// Parse a work item from JSON, accepting the `payload` wrapper or a flat object.
    pub fn from_json(json: &str, path: &str) -> Result<Self, ConfigError> {
        let file: WorkItemFile =
            serde_json::from_str(json).map_err(|source| ConfigError::WorkItem {
                path: path.to_string(),
                source,
            })?;
        Ok(match file {
            WorkItemFile::Wrapped { payload } => payload,
            WorkItemFile::Flat(item) => item,
        })
    }

    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let item = Self::from_json(&json, path)?;
        info!(?item, "Loaded work item");
        Ok(item)
    }

    /// Fill unset fields from `fallback`; values already present win.
    pub fn or(self, fallback: WorkItem) -> WorkItem {
        WorkItem {
            search_phrase: self.search_phrase.or(fallback.search_phrase),
            news_category: self.news_category.or(fallback.news_category),
            months: self.months.or(fallback.months),
        }
    }

    /// Validate into a [`SearchQuery`]. Missing months means zero (current month only).
    pub fn into_query(self) -> Result<SearchQuery, ConfigError> {
        let months = self.months.unwrap_or(0);
        let months = u32::try_from(months).map_err(|_| ConfigError::InvalidMonths(months))?;
        let phrase = self.search_phrase.ok_or(ConfigError::MissingPhrase)?;
        SearchQuery::new(phrase, self.news_category, months)
    }
}
