//! Retention rules: the ordered configuration the purge engine runs over.
//!
//! A rule names a mail label, a retention period in days, and exclusion
//! flags for starred and important mail. Rules live in an ordered store;
//! their position in that order is the only identity the engine relies on
//! when resuming a pass across invocations.

mod model;
mod repository;

pub use model::{RetentionRule, RuleDraft};
pub use repository::RuleRepository;

use crate::Result;

/// Read-only view of the ordered rule store, as consumed by the engine.
///
/// Rows are addressed by 1-based position in store order. Implementations
/// must return rows in that order; it is the only tie-break and determines
/// resumption order across invocations.
#[allow(async_fn_in_trait)]
pub trait RuleStore {
    /// Returns the number of rule rows currently in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn row_count(&self) -> Result<u32>;

    /// Reads up to `count` rows starting at `start_row` (1-based), in store
    /// order. Reading past the end yields fewer rows, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn read_range(&self, start_row: u32, count: u32) -> Result<Vec<RetentionRule>>;
}
