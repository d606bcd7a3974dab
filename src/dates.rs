//! Publication-date parsing and the month-aligned retention window.
//!
//! The results page prints timestamps in several shapes. [`classify`] tries
//! each accepted format in order and compares the first successful parse
//! against the window cutoff.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Accepted timestamp formats, in tie-break order.
///
/// Numeric month/day/year is tried before day/month/year, so `03/04/2024`
/// reads as March 4th. Sites using day-first numeric dates need the
/// `%d/%m/%Y` and `%d-%m-%Y` entries moved ahead of their month-first twins.
pub const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",  // Apr 22, 2024
    "%b. %d, %Y", // Apr. 22, 2024
    "%B %d, %Y",  // April 22, 2024
    "%B. %d, %Y", // April. 22, 2024
    "%d %B %Y",   // 22 April 2024
    "%d %b %Y",   // 22 Apr 2024
    "%d %b. %Y",  // 22 Apr. 2024
    "%Y-%m-%d",   // 2024-04-22
    "%m/%d/%Y",   // 04/22/2024
    "%d/%m/%Y",   // 22/04/2024
    "%m-%d-%Y",   // 04-22-2024
    "%d-%m-%Y",   // 22-04-2024
];

// AP style abbreviates September as "Sept.", which no strftime month name accepts.
static AP_SEPTEMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsept\b").expect("september pattern is valid"));

/// The range of publication dates a crawl keeps.
///
/// Everything on or after `cutoff` is inside the window. The cutoff is fixed
/// when the window is built and never moves, even if the crawl runs across a
/// month boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    cutoff: NaiveDate,
}

impl RetentionWindow {
    /// Window for `months` calendar months ending in the month of `today`.
    ///
    /// `months == 0` and `months == 1` both keep only the current month;
    /// `months == 3` on 2024-04-17 keeps everything since 2024-02-01.
    pub fn from_months(today: NaiveDate, months: u32) -> Self {
        let month_start = today - Days::new(u64::from(today.day0()));
        let back = months.saturating_sub(1);
        let cutoff = month_start
            .checked_sub_months(Months::new(back))
            .unwrap_or(NaiveDate::MIN);
        Self { cutoff }
    }

    /// Window anchored on the local calendar date at the moment of the call.
    pub fn starting_now(months: u32) -> Self {
        Self::from_months(Local::now().date_naive(), months)
    }

    /// First day inside the window.
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }
}

/// Where a raw timestamp falls relative to a [`RetentionWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateClass {
    InWindow,
    OutOfWindow,
    /// No accepted format matched. Callers keep processing the article.
    Unparseable,
}

/// Parse a timestamp with the first matching entry of [`DATE_FORMATS`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let normalized = AP_SEPTEMBER.replace_all(raw.trim(), "Sep");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

/// Classify a raw timestamp against the retention window.
pub fn classify(raw: &str, window: &RetentionWindow) -> DateClass {
    match parse_date(raw) {
        None => {
            warn!(raw_date = %raw, "Could not parse article date with any known format");
            DateClass::Unparseable
        }
        Some(date) if date < window.cutoff => {
            debug!(%date, cutoff = %window.cutoff, "Article date is before cutoff");
            DateClass::OutOfWindow
        }
        Some(_) => DateClass::InWindow,
    }
}
