//! Bounded batch loading from the rule store.

use crate::Result;
use crate::rule::{RetentionRule, RuleStore};

/// A contiguous window of rules plus the cursor for the following batch.
#[derive(Debug, Clone)]
pub struct RuleBatch {
    /// Rules in store order; empty when the cursor is already past the end.
    pub rules: Vec<RetentionRule>,
    /// 1-based row the next invocation should start at. For an empty batch
    /// this is the unchanged cursor.
    pub next_cursor: u32,
}

impl RuleBatch {
    /// True when there was nothing left to load at the cursor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Loads the batch `[cursor, min(cursor + max_batch_size - 1, total_rows)]`
/// (1-based, inclusive) from the store.
///
/// A cursor past `total_rows` yields an empty batch with the cursor
/// unchanged, which signals a completed pass upstream. The store is never
/// mutated.
///
/// # Errors
///
/// Returns an error if reading the store fails.
pub async fn load_batch<R: RuleStore>(
    store: &R,
    cursor: u32,
    max_batch_size: u32,
    total_rows: u32,
) -> Result<RuleBatch> {
    if cursor > total_rows {
        return Ok(RuleBatch {
            rules: Vec::new(),
            next_cursor: cursor,
        });
    }

    let max_batch_size = max_batch_size.max(1);
    let last_row = cursor
        .saturating_add(max_batch_size - 1)
        .min(total_rows);
    let count = last_row - cursor + 1;

    let rules = store.read_range(cursor, count).await?;
    Ok(RuleBatch {
        rules,
        next_cursor: last_row.saturating_add(1),
    })
}
