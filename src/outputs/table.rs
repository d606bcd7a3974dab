//! CSV table of extracted articles.
//!
//! One header row followed by one row per record, in crawl order:
//!
//! ```text
//! Title,Date,Description,Image filename,Search count,Contains money flag
//! ```

use crate::error::OutputError;
use crate::models::ArticleRecord;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const HEADER: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Image filename",
    "Search count",
    "Contains money flag",
];

/// Encode records as CSV bytes.
pub fn to_csv(records: &[ArticleRecord]) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for record in records {
        let image = record.image_file.to_string();
        let count = record.match_count.to_string();
        writer.write_record([
            record.title.as_str(),
            record.raw_date.as_str(),
            record.description.as_str(),
            image.as_str(),
            count.as_str(),
            if record.has_monetary_value { "True" } else { "False" },
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| OutputError::Io(e.into_error()))
}

/// Write the record table to `path`, replacing any existing file.
#[instrument(level = "info", skip(records), fields(path = %path.display(), count = records.len()))]
pub async fn write_table(records: &[ArticleRecord], path: &Path) -> Result<(), OutputError> {
    let bytes = to_csv(records)?;
    fs::write(path, bytes).await?;
    info!("Wrote article table");
    Ok(())
}
