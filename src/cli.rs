//! Command-line interface definitions.
//!
//! Search parameters can come from flags, environment variables or a JSON
//! work item; flags and environment variables win over the work item.

use crate::config::WorkItem;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the crawler.
///
/// # Examples
///
/// ```sh
/// # Phrase and window on the command line
/// latimes_news_crawler --search-phrase Nasdaq --news-category Business --months 3
///
/// # Parameters from a work item, custom site profile
/// latimes_news_crawler --work-item Resources/input_work_item.json --config site.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Phrase to search for
    #[arg(short, long, env = "SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Category filter to apply to the results (matched case-insensitively)
    #[arg(short = 'c', long, env = "NEWS_CATEGORY")]
    pub news_category: Option<String>,

    /// Number of calendar months to keep, counting the current one (0 = current month)
    #[arg(short, long, env = "MONTHS")]
    pub months: Option<i64>,

    /// JSON work item holding `search_phrase`, `news_category` and `months`
    #[arg(short, long, env = "WORK_ITEM")]
    pub work_item: Option<String>,

    /// Optional path to a YAML site profile (selectors, timeouts, base URL)
    #[arg(long)]
    pub config: Option<String>,

    /// Directory for the table, JSON dump and downloaded images
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// File name of the CSV table inside the output directory
    #[arg(long, default_value = "news_data.csv")]
    pub table_file: String,

    /// Also write the records as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Browser binary to launch instead of the auto-detected one
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,
}

impl Cli {
    /// Search parameters given directly on the command line or environment.
    pub fn work_item_overrides(&self) -> WorkItem {
        WorkItem {
            search_phrase: self.search_phrase.clone(),
            news_category: self.news_category.clone(),
            months: self.months,
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.table_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "latimes_news_crawler",
            "--search-phrase",
            "Nasdaq",
            "--news-category",
            "Business",
            "--months",
            "3",
        ]);

        assert_eq!(cli.search_phrase.as_deref(), Some("Nasdaq"));
        assert_eq!(cli.news_category.as_deref(), Some("Business"));
        assert_eq!(cli.months, Some(3));
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.table_path(), PathBuf::from("output/news_data.csv"));
        assert_eq!(cli.images_dir(), PathBuf::from("output/images"));
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "latimes_news_crawler",
            "-w",
            "/tmp/work_item.json",
            "-o",
            "/tmp/out",
        ]);

        assert_eq!(cli.work_item.as_deref(), Some("/tmp/work_item.json"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_overrides_carry_flags() {
        let cli = Cli::parse_from(["latimes_news_crawler", "-s", "climate", "-m", "0"]);
        let item = cli.work_item_overrides();
        assert_eq!(item.search_phrase.as_deref(), Some("climate"));
        assert_eq!(item.months, Some(0));
    }
}
