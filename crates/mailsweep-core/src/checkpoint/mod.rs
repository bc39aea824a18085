//! Checkpoint persistence: where the next purge invocation resumes.
//!
//! The engine processes rules in bounded batches across repeated, time-limited
//! invocations. A single cursor, the 1-based row of the next unprocessed
//! rule, is the only durable progress signal. It is written only after a
//! batch fully succeeds and deleted once a full pass completes, so the last
//! persisted value is always a safe resume point.

mod manager;
mod repository;
mod store;

pub use manager::{CheckpointManager, FIRST_DATA_ROW};
pub use repository::CheckpointRepository;
pub use store::{CheckpointStore, MemoryCheckpointStore};
