//! Durable key-value storage behind the checkpoint cursor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Result;

/// Durable string key-value storage for checkpoint state.
///
/// The engine uses a single fixed key; the trait still takes the key as a
/// parameter so one store can back several engines. An explicit store
/// passed into the orchestrator replaces the global script-property state
/// the engine's history grew out of; there is no module-level mutable
/// state anywhere in this crate.
#[allow(async_fn_in_trait)]
pub trait CheckpointStore {
    /// Returns the stored value for `key`, or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory checkpoint store for tests and ephemeral runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCheckpointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}
