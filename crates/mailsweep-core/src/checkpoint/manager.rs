//! Cursor semantics over a checkpoint store.

use tracing::warn;

use super::store::CheckpointStore;
use crate::Result;

/// First data row of the rule store; where a fresh pass begins.
pub const FIRST_DATA_ROW: u32 = 1;

/// Key under which the purge cursor is persisted.
const CURSOR_KEY: &str = "purge.next_row";

/// Tracks the next unprocessed rule row across invocations.
///
/// Each invocation is a fresh process; there is no in-memory caching here.
/// Every call goes to the underlying store.
pub struct CheckpointManager<S> {
    store: S,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    /// Creates a manager over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the persisted cursor, or [`FIRST_DATA_ROW`] when unset.
    ///
    /// Absence is a normal state, not an error. A stored value that does
    /// not parse as a row number is treated as absent and logged, since a
    /// corrupt cursor has no better recovery than a fresh pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn cursor(&self) -> Result<u32> {
        match self.store.get(CURSOR_KEY).await? {
            None => Ok(FIRST_DATA_ROW),
            Some(raw) => match raw.parse::<u32>() {
                Ok(row) if row >= FIRST_DATA_ROW => Ok(row),
                _ => {
                    warn!(value = %raw, "ignoring unparsable checkpoint cursor");
                    Ok(FIRST_DATA_ROW)
                }
            },
        }
    }

    /// Persists the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn set_cursor(&self, row: u32) -> Result<()> {
        self.store.set(CURSOR_KEY, &row.to_string()).await
    }

    /// Deletes the cursor; the next run restarts from [`FIRST_DATA_ROW`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub async fn reset(&self) -> Result<()> {
        self.store.delete(CURSOR_KEY).await
    }
}
