//! # LA Times News Crawler
//!
//! Searches a news site for a phrase, walks the newest-first result pages,
//! and records every article published inside a month-aligned retention
//! window, together with text signals and a downloaded thumbnail.
//!
//! ## Usage
//!
//! ```sh
//! latimes_news_crawler --search-phrase Nasdaq --news-category Business --months 3
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: Resolve the query from flags and/or a JSON work item,
//!    and the site profile from built-in defaults or YAML
//! 2. **Search**: Drive Chromium through the search form, sort newest first,
//!    apply the category filter
//! 3. **Crawl**: Extract rows page by page until an article is older than the
//!    window or the pages run out
//! 4. **Output**: Write the CSV table (and optionally a JSON dump)

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod backend;
mod cli;
mod config;
mod dates;
mod error;
mod images;
mod models;
mod outputs;
mod scrapers;
mod utils;

use backend::chromium::{ChromiumBackend, ChromiumOptions};
use cli::Cli;
use config::{SiteProfile, WorkItem};
use images::ImageResolver;
use models::SearchQuery;
use outputs::{json, table};
use scrapers::search::SearchCrawler;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration (fatal before any navigation) ----
    let query = match resolve_query(&args).await {
        Ok(query) => query,
        Err(e) => {
            error!(error = %e, "Invalid search configuration; nothing was crawled");
            return Err(e);
        }
    };
    info!(
        phrase = %query.phrase(),
        category = ?query.category(),
        months = query.window_months(),
        "Search query resolved"
    );

    let profile = SiteProfile::load(args.config.as_deref()).await?;

    for dir in [args.output_dir.clone(), args.images_dir()] {
        if let Err(e) = ensure_writable_dir(&dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    let images = ImageResolver::new(args.images_dir(), profile.timeouts.image_download())?;

    // ---- Crawl ----
    let mut backend = ChromiumBackend::launch(ChromiumOptions {
        headful: args.headful,
        executable: args.chrome_path.clone(),
        navigation_timeout: profile.timeouts.navigation(),
        operation_timeout: profile.timeouts.operation(),
    })
    .await?;

    let outcome = SearchCrawler::new(&mut backend, &profile, &images)
        .run(&query)
        .await;
    backend.close().await;

    info!(
        records = outcome.records.len(),
        pages = outcome.pages_visited,
        termination = %outcome.termination,
        cutoff = %outcome.cutoff,
        "Crawl complete"
    );

    // ---- Output ----
    let table_path = args.table_path();
    if let Err(e) = table::write_table(&outcome.records, &table_path).await {
        error!(path = %table_path.display(), error = %e, "Failed writing article table");
        match json::rescue_records(&outcome.records, &std::env::temp_dir()).await {
            Ok(path) => error!(path = %path.display(), "Unwritten records saved as JSON"),
            Err(rescue_err) => match serde_json::to_string(&outcome.records) {
                Ok(dump) => error!(error = %rescue_err, records = %dump, "Unwritten records"),
                Err(dump_err) => error!(error = %dump_err, "Could not serialize unwritten records"),
            },
        }
        return Err(e.into());
    }

    if let Some(json_path) = &args.json_output {
        let report = json::CrawlReport {
            search_phrase: query.phrase(),
            news_category: query.category(),
            cutoff: outcome.cutoff,
            termination: outcome.termination.to_string(),
            articles: &outcome.records,
        };
        if let Err(e) = json::write_records(&report, json_path).await {
            error!(path = %json_path.display(), error = %e, "Failed to write JSON records");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Merge command-line values over the optional work item and validate them.
async fn resolve_query(args: &Cli) -> Result<SearchQuery, Box<dyn Error>> {
    let overrides = args.work_item_overrides();
    let item = match &args.work_item {
        Some(path) => overrides.or(WorkItem::load(path).await?),
        None => overrides,
    };
    Ok(item.into_query()?)
}
