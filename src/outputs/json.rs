//! JSON dump of extracted articles.
//!
//! Serializes the crawl result for consumption by other tools. The file
//! holds the query, the window cutoff, how the crawl ended, and the records
//! in presentation order:
//!
//! ```json
//! {
//!   "search_phrase": "Nasdaq",
//!   "cutoff": "2024-02-01",
//!   "termination": "stopped",
//!   "articles": [ { "title": "...", "raw_date": "...", ... } ]
//! }
//! ```

use crate::error::OutputError;
use crate::models::ArticleRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Top-level document written by [`write_records`].
#[derive(Debug, Serialize)]
pub struct CrawlReport<'a> {
    pub search_phrase: &'a str,
    pub news_category: Option<&'a str>,
    pub cutoff: NaiveDate,
    pub termination: String,
    pub articles: &'a [ArticleRecord],
}

/// Write a [`CrawlReport`] to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_records(report: &CrawlReport<'_>, path: &Path) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(count = report.articles.len(), "Wrote JSON records");
    Ok(())
}

/// File name used by [`rescue_records`].
pub const RESCUE_FILE: &str = "latimes_unwritten_records.json";

/// Save records that could not reach the table as a JSON array in `dir`.
///
/// Returns the path written so the caller can report it.
#[instrument(level = "info", skip(records), fields(dir = %dir.display(), count = records.len()))]
pub async fn rescue_records(records: &[ArticleRecord], dir: &Path) -> Result<PathBuf, OutputError> {
    let json = serde_json::to_string_pretty(records)?;
    let path = dir.join(RESCUE_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Saved unwritten records");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageFile;

    #[tokio::test]
    async fn test_rescue_records_keeps_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let articles = vec![
            ArticleRecord {
                title: "First".to_string(),
                raw_date: "Feb 15, 2024".to_string(),
                description: String::new(),
                image_file: ImageFile::NoImage,
                match_count: 0,
                has_monetary_value: false,
            },
            ArticleRecord {
                title: "Second".to_string(),
                raw_date: "Feb 14, 2024".to_string(),
                description: "$5".to_string(),
                image_file: ImageFile::NoImage,
                match_count: 0,
                has_monetary_value: true,
            },
        ];

        let path = rescue_records(&articles, dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join(RESCUE_FILE));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["title"], "Second");
    }

    #[tokio::test]
    async fn test_rescue_records_reports_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = rescue_records(&[], &dir.path().join("gone")).await.unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
    }

    #[tokio::test]
    async fn test_write_records_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("news.json");
        let articles = vec![ArticleRecord {
            title: "Nasdaq rises".to_string(),
            raw_date: "Feb 15, 2024".to_string(),
            description: "It cost 500 dollars".to_string(),
            image_file: ImageFile::NoImage,
            match_count: 1,
            has_monetary_value: true,
        }];
        let report = CrawlReport {
            search_phrase: "Nasdaq",
            news_category: None,
            cutoff: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            termination: "stopped".to_string(),
            articles: &articles,
        };

        write_records(&report, &path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["cutoff"], "2024-02-01");
        assert_eq!(value["termination"], "stopped");
        assert_eq!(value["articles"][0]["image_file"], "No image");
        assert_eq!(value["articles"][0]["has_monetary_value"], true);
    }
}
