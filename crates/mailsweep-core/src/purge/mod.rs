//! The purge engine: query building, batch loading, rule execution, and the
//! per-invocation orchestration over them.
//!
//! One scheduled invocation flows through [`BatchOrchestrator::run_once`]:
//! read the checkpoint cursor, load a bounded batch of rules, apply each
//! rule to the mailbox through [`PurgeExecutor`], then advance the
//! checkpoint, or reset it once a full pass over the rule store completes.
//! The purge is a perpetually repeating pass rather than a one-shot job.

mod batch;
mod executor;
mod orchestrator;
mod query;

pub use batch::{RuleBatch, load_batch};
pub use executor::{PurgeExecutor, RuleOutcome};
pub use orchestrator::{
    BatchOrchestrator, DEFAULT_MAX_BATCH_SIZE, DEFAULT_SEARCH_PAGE_SIZE, PassOutcome, PurgeConfig,
    PurgeReport,
};
pub use query::build_search_filter;
