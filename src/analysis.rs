//! Text signals computed for each article: how often the search phrase
//! appears and whether the text mentions money.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Amount patterns, tried in order: `$1,250.00`, `500 dollars`, `500 USD`.
static MONEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\$\d+(?:,\d{3})*(?:\.\d{2})?",
        r"\d+\s+dollars",
        r"\d+\s+USD",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("money pattern is valid"))
    .collect()
});

/// Count case-insensitive, non-overlapping occurrences of `phrase`.
///
/// Title and description are counted separately and summed, so a match that
/// would span the two fields is never counted.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(count_occurrences("Nasdaq rises", "Stocks on Nasdaq gain", "nasdaq"), 2);
/// ```
pub fn count_occurrences(title: &str, description: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    let needle = phrase.to_lowercase();
    let in_title = title.to_lowercase().matches(&needle).count();
    let in_description = description.to_lowercase().matches(&needle).count();
    debug!(in_title, in_description, phrase, "Counted phrase occurrences");
    in_title + in_description
}

/// Whether `text` contains a monetary amount.
///
/// Returns on the first pattern that matches. No locale normalization is
/// attempted beyond the three accepted shapes.
pub fn contains_monetary_value(text: &str) -> bool {
    MONEY_PATTERNS.iter().any(|re| re.is_match(text))
}
