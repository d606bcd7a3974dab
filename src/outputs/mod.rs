//! Output sinks for extracted records.
//!
//! # Submodules
//!
//! - [`table`]: the record table as CSV, one row per article
//! - [`json`]: the same records as a JSON report with the query and cutoff
//!
//! Both keep the crawl's presentation order.

pub mod json;
pub mod table;
