//! Search-filter construction.

use chrono::NaiveDate;

/// Builds the search filter for one rule.
///
/// The base term is `label:<label> before:<YYYY-MM-DD>`. Exclusion terms are
/// appended in fixed order, starred before important, so the same inputs
/// always yield byte-identical filters. Excluding at the query level shrinks
/// the result set; the executor still re-checks both flags per message.
///
/// Pure and infallible. An empty label yields a syntactically valid filter
/// with an empty label term; callers avoid that by skipping inactive rules.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use mailsweep_core::purge::build_search_filter;
///
/// let cutoff = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// assert_eq!(
///     build_search_filter("Inbox", cutoff, true, true),
///     "label:Inbox before:2024-01-01 -is:starred -is:important",
/// );
/// ```
#[must_use]
pub fn build_search_filter(
    label: &str,
    cutoff: NaiveDate,
    exclude_starred: bool,
    exclude_important: bool,
) -> String {
    let mut filter = format!("label:{label} before:{}", cutoff.format("%Y-%m-%d"));

    if exclude_starred {
        filter.push_str(" -is:starred");
    }

    if exclude_important {
        filter.push_str(" -is:important");
    }

    filter
}
