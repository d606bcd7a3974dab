//! Search-results scraping.
//!
//! The crawl is split the same way the results page is laid out:
//!
//! | Module | Role |
//! |--------|------|
//! | [`search`] | Submits the search, sorts and filters, pages through results |
//! | [`article`] | Turns one result row into an `ArticleRecord` |
//!
//! Both are written against the [`RenderBackend`](crate::backend::RenderBackend)
//! trait only, so the same crawl runs on Chromium or on in-memory snapshots.

pub mod article;
pub mod search;
