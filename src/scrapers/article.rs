//! Extraction of a single search-result row into an [`ArticleRecord`].
//!
//! Only the date step can end the crawl: an article older than the retention
//! window means every later result is older too, because results are sorted
//! newest first. Every other field degrades instead of failing.

use crate::analysis::{contains_monetary_value, count_occurrences};
use crate::backend::{RenderBackend, RowHandle};
use crate::config::Selectors;
use crate::dates::{DateClass, RetentionWindow, classify};
use crate::error::BackendError;
use crate::images::ImageResolver;
use crate::models::{ArticleRecord, ImageFile, SearchQuery};
use crate::utils::truncate_for_log;
use tracing::{debug, info, instrument, warn};

/// Outcome of extracting one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Record(ArticleRecord),
    /// This article and everything after it is outside the retention window.
    Stop,
}

/// Turns result rows into records.
#[derive(Debug)]
pub struct ArticleExtractor<'a> {
    selectors: &'a Selectors,
    images: &'a ImageResolver,
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(selectors: &'a Selectors, images: &'a ImageResolver) -> Self {
        Self { selectors, images }
    }

    /// Extract one row.
    ///
    /// # Returns
    ///
    /// [`Extraction::Stop`] when the row's date is before the window cutoff,
    /// otherwise a record. Unparseable dates are kept (fail-open).
    ///
    /// # Errors
    ///
    /// Only when the row's date text cannot be read at all; the caller skips
    /// the row. Title, description and image failures degrade to empty text
    /// or `No image`.
    #[instrument(level = "info", skip_all, fields(row = row.index()))]
    pub async fn extract<B: RenderBackend>(
        &self,
        backend: &mut B,
        row: &RowHandle,
        query: &SearchQuery,
        window: &RetentionWindow,
    ) -> Result<Extraction, BackendError> {
        let title = self.read_or_empty(backend, row, &self.selectors.row_title, "title").await;
        info!(%title, "Extracting article");

        let raw_date = backend.row_text(row, &self.selectors.row_date).await?;
        match classify(&raw_date, window) {
            DateClass::OutOfWindow => {
                info!(%raw_date, cutoff = %window.cutoff(), "Article is older than the retention window");
                return Ok(Extraction::Stop);
            }
            DateClass::Unparseable => {
                warn!(%raw_date, "Keeping article with unparseable date");
            }
            DateClass::InWindow => {}
        }

        let description = self
            .read_or_empty(backend, row, &self.selectors.row_description, "description")
            .await;
        let image_file = self.image(backend, row).await;

        let match_count = count_occurrences(&title, &description, query.phrase());
        let has_monetary_value = contains_monetary_value(&description);
        debug!(
            match_count,
            has_monetary_value,
            description = %truncate_for_log(&description, 120),
            "Analyzed article text"
        );

        Ok(Extraction::Record(ArticleRecord {
            title,
            raw_date,
            description,
            image_file,
            match_count,
            has_monetary_value,
        }))
    }

    async fn read_or_empty<B: RenderBackend>(
        &self,
        backend: &mut B,
        row: &RowHandle,
        selector: &str,
        field: &'static str,
    ) -> String {
        match backend.row_text(row, selector).await {
            Ok(text) => text,
            Err(e) => {
                warn!(field, selector, error = %e, "Field unreadable; leaving it empty");
                String::new()
            }
        }
    }

    async fn image<B: RenderBackend>(&self, backend: &mut B, row: &RowHandle) -> ImageFile {
        let attribute = backend
            .row_attribute(row, &self.selectors.row_image, &self.selectors.row_image_attribute)
            .await;
        match attribute {
            Ok(Some(raw)) => self.images.resolve(&raw).await,
            Ok(None) => {
                debug!(selector = %self.selectors.row_image, "Image element has no source attribute");
                ImageFile::NoImage
            }
            Err(e) => {
                debug!(error = %e, "Row has no image");
                ImageFile::NoImage
            }
        }
    }
}
