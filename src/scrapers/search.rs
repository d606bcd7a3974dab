//! Search-results crawler.
//!
//! Drives a [`RenderBackend`] through the site's search flow and pages through
//! the newest-first result list until an article falls outside the retention
//! window ([`Termination::Stopped`]) or the pages run out
//! ([`Termination::Exhausted`]).
//!
//! # Failure scopes
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Search flow | Logged; empty result |
//! | Sort / category filter | Logged; crawl continues unsorted/unfiltered |
//! | Page count header | Logged; empty result |
//! | Row | Logged; row skipped |
//! | Page | Logged; page skipped, next page still attempted |
//! | Next-page link | Logged; crawl ends as exhausted |

use super::article::{ArticleExtractor, Extraction};
use crate::backend::RenderBackend;
use crate::config::SiteProfile;
use crate::dates::RetentionWindow;
use crate::error::BackendError;
use crate::images::ImageResolver;
use crate::models::{ArticleRecord, CrawlOutcome, SearchQuery, Termination};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Result of the best-effort category filter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No category was requested.
    NotRequested,
    /// The checkbox with this label was ticked.
    Applied(String),
    /// No filter entry matched the requested category.
    Unavailable,
}

/// Mutable progress of one crawl. Owned by the crawler alone.
#[derive(Debug, Default)]
struct CrawlState {
    current_page_index: usize,
    accumulated_records: Vec<ArticleRecord>,
    stopped: bool,
}

impl CrawlState {
    fn finish(self, pages_visited: usize, window: &RetentionWindow) -> CrawlOutcome {
        let termination = if self.stopped {
            Termination::Stopped
        } else {
            Termination::Exhausted
        };
        info!(
            records = self.accumulated_records.len(),
            pages_visited,
            %termination,
            "Crawl finished"
        );
        CrawlOutcome {
            records: self.accumulated_records,
            termination,
            pages_visited,
            cutoff: window.cutoff(),
        }
    }
}

/// Read the total page count from the results header, e.g. `1 of 1,234`.
pub fn parse_page_count(header: &str) -> Option<usize> {
    header
        .split_whitespace()
        .last()?
        .replace(',', "")
        .parse()
        .ok()
}

/// Crawls one search query through a rendering backend.
pub struct SearchCrawler<'a, B> {
    backend: &'a mut B,
    profile: &'a SiteProfile,
    images: &'a ImageResolver,
}

impl<'a, B: RenderBackend> SearchCrawler<'a, B> {
    pub fn new(backend: &'a mut B, profile: &'a SiteProfile, images: &'a ImageResolver) -> Self {
        Self {
            backend,
            profile,
            images,
        }
    }

    /// Crawl `query` with a retention window anchored on today's date.
    ///
    /// The window is computed once, here, and reused for the whole crawl.
    pub async fn run(&mut self, query: &SearchQuery) -> CrawlOutcome {
        let window = RetentionWindow::starting_now(query.window_months());
        self.run_with_window(query, window).await
    }

    /// Crawl `query` against an explicit retention window.
    ///
    /// Never fails: every backend error is absorbed at the smallest scope
    /// that contains it and the records gathered so far are returned.
    #[instrument(level = "info", skip_all, fields(phrase = %query.phrase(), category = ?query.category(), cutoff = %window.cutoff()))]
    pub async fn run_with_window(
        &mut self,
        query: &SearchQuery,
        window: RetentionWindow,
    ) -> CrawlOutcome {
        let mut state = CrawlState::default();

        if let Err(e) = self.search(query).await {
            error!(error = %e, phrase = %query.phrase(), "Search failed; no results");
            return state.finish(0, &window);
        }
        self.prepare_results(query).await;

        let page_count = match self.page_count().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, selector = %self.profile.selectors.page_counts, "Invalid page number; no results");
                return state.finish(0, &window);
            }
        };
        info!(page_count, "Result pages available");

        let profile = self.profile;
        let extractor = ArticleExtractor::new(&profile.selectors, self.images);
        let mut pages_visited = 0;

        while state.current_page_index < page_count {
            pages_visited += 1;
            let page = state.current_page_index + 1;

            match self.process_page(&extractor, &mut state, query, &window).await {
                Ok(()) if state.stopped => return state.finish(pages_visited, &window),
                Ok(()) => debug!(page, records = state.accumulated_records.len(), "Page complete"),
                Err(e) => error!(page, error = %e, "Page failed; skipping it"),
            }

            state.current_page_index += 1;
            if state.current_page_index >= page_count {
                break;
            }
            if !self.next_page().await {
                break;
            }
        }

        state.finish(pages_visited, &window)
    }

    /// Open the site and submit the search phrase.
    #[instrument(level = "info", skip_all)]
    async fn search(&mut self, query: &SearchQuery) -> Result<(), BackendError> {
        let sel = &self.profile.selectors;
        self.backend.navigate(&self.profile.base_url).await?;
        self.backend
            .wait_until_visible(&sel.search_button, self.profile.timeouts.navigation())
            .await?;
        self.backend.click(&sel.search_button).await?;
        self.backend
            .type_text(&sel.search_input, query.phrase())
            .await?;
        self.backend.click(&sel.search_submit).await?;
        info!(phrase = %query.phrase(), "Search submitted");
        Ok(())
    }

    /// Sort newest first and apply the category filter. Both are best-effort.
    async fn prepare_results(&mut self, query: &SearchQuery) {
        let sel = &self.profile.selectors;
        let wait = self.profile.timeouts.element_wait();

        if let Err(e) = self.backend.wait_until_visible(&sel.result_rows, wait).await {
            warn!(error = %e, "Result list did not render after search");
        }

        match self
            .backend
            .select_by_label(&sel.sort_select, &self.profile.newest_label)
            .await
        {
            Ok(()) => info!(label = %self.profile.newest_label, "Sorted results"),
            Err(e) => error!(
                error = %e,
                selector = %sel.sort_select,
                "Could not sort newest first; date cutoff may end the crawl early"
            ),
        }

        match self.apply_category_filter(query.category()).await {
            Ok(FilterOutcome::NotRequested) => {}
            Ok(FilterOutcome::Applied(label)) => info!(%label, "Category filter applied"),
            Ok(FilterOutcome::Unavailable) => error!(
                category = ?query.category(),
                "Category not found on page; continuing unfiltered"
            ),
            Err(e) => error!(
                category = ?query.category(),
                error = %e,
                "Category filter failed; continuing unfiltered"
            ),
        }

        sleep(self.profile.timeouts.settle()).await;
    }

    /// Tick the filter checkbox whose label contains `category`, ignoring case.
    #[instrument(level = "info", skip(self))]
    pub async fn apply_category_filter(
        &mut self,
        category: Option<&str>,
    ) -> Result<FilterOutcome, BackendError> {
        let Some(category) = category else {
            return Ok(FilterOutcome::NotRequested);
        };
        let sel = &self.profile.selectors;
        let wanted = category.to_lowercase();

        self.backend.click(&sel.category_see_all).await?;
        for option in self.backend.list_elements(&sel.category_options).await? {
            let label = match self.backend.row_text(&option, &sel.category_label).await {
                Ok(label) => label,
                Err(e) => {
                    debug!(index = option.index(), error = %e, "Filter entry has no label");
                    continue;
                }
            };
            if label.to_lowercase().contains(&wanted) {
                self.backend
                    .row_click(&option, &sel.category_input)
                    .await?;
                return Ok(FilterOutcome::Applied(label));
            }
        }
        Ok(FilterOutcome::Unavailable)
    }

    async fn page_count(&mut self) -> Result<usize, BackendError> {
        let selector = &self.profile.selectors.page_counts;
        self.backend
            .wait_until_visible(selector, self.profile.timeouts.element_wait())
            .await?;
        let header = self.backend.get_text(selector).await?;
        parse_page_count(&header).ok_or_else(|| BackendError::NotFound {
            selector: format!("{selector} (page count in `{header}`)"),
        })
    }

    /// Extract every row on the current page, stopping at the first
    /// out-of-window article.
    #[instrument(level = "info", skip_all, fields(page = state.current_page_index + 1))]
    async fn process_page(
        &mut self,
        extractor: &ArticleExtractor<'_>,
        state: &mut CrawlState,
        query: &SearchQuery,
        window: &RetentionWindow,
    ) -> Result<(), BackendError> {
        let list = &self.profile.selectors.result_rows;
        self.backend
            .wait_until_visible(list, self.profile.timeouts.element_wait())
            .await?;
        let rows = self.backend.list_elements(list).await?;
        info!(rows = rows.len(), "Processing result page");

        for row in &rows {
            match extractor.extract(&mut *self.backend, row, query, window).await {
                Ok(Extraction::Record(record)) => state.accumulated_records.push(record),
                Ok(Extraction::Stop) => {
                    state.stopped = true;
                    return Ok(());
                }
                Err(e) => warn!(
                    index = row.index(),
                    phrase = %query.phrase(),
                    error = %e,
                    "Row failed; skipping it"
                ),
            }
        }
        Ok(())
    }

    /// Follow the next-page link. Returns `false` when there is no next page.
    async fn next_page(&mut self) -> bool {
        let selector = &self.profile.selectors.next_page_link;
        let href = match self.backend.get_attribute(selector, "href").await {
            Ok(Some(href)) => href,
            Ok(None) => {
                info!("Next-page link has no target; no more pages");
                return false;
            }
            Err(e) => {
                info!(error = %e, "No next-page link; no more pages");
                return false;
            }
        };

        let target = match Url::parse(&self.profile.base_url).and_then(|base| base.join(&href)) {
            Ok(url) => url.to_string(),
            Err(_) => href,
        };
        match self.backend.navigate(&target).await {
            Ok(()) => true,
            Err(e) => {
                error!(url = %target, error = %e, "Could not open next page");
                false
            }
        }
    }
}
