//! # mailsweep-core
//!
//! Resumable batch-purge engine for mailbox retention rules.
//!
//! This crate provides:
//! - Retention rule storage (`SQLite`) and the ordered rule-store contract
//! - Checkpointed, bounded batch processing across repeated invocations
//! - Search-filter construction and per-rule purge execution
//! - A mailbox abstraction with an in-memory reference implementation
//!
//! Each scheduled invocation does a bounded amount of work and persists a
//! single cursor as its only durable progress signal, so a host-imposed
//! execution-time limit never loses more than the current batch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod checkpoint;
mod error;
pub mod mailbox;
pub mod purge;
pub mod rule;
pub mod time;

pub use checkpoint::{
    CheckpointManager, CheckpointRepository, CheckpointStore, FIRST_DATA_ROW, MemoryCheckpointStore,
};
pub use error::{Error, Result};
pub use mailbox::{
    MailMessage, MailThread, MailboxError, MemoryMessageStore, MessageStore, StoredMessage,
    StoredThread,
};
pub use purge::{
    BatchOrchestrator, PassOutcome, PurgeConfig, PurgeExecutor, PurgeReport, RuleBatch,
    RuleOutcome, build_search_filter, load_batch,
};
pub use rule::{RetentionRule, RuleDraft, RuleRepository, RuleStore};
pub use time::{Clock, FixedClock, SystemClock};
