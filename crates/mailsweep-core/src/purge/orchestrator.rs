//! One purge invocation end to end.

use tracing::{info, warn};

use super::batch::load_batch;
use super::executor::PurgeExecutor;
use crate::Result;
use crate::checkpoint::{CheckpointManager, CheckpointStore};
use crate::mailbox::MessageStore;
use crate::rule::RuleStore;
use crate::time::Clock;

/// Default number of rule rows processed per invocation.
pub const DEFAULT_MAX_BATCH_SIZE: u32 = 10;

/// Default cap on threads searched per rule per invocation.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 50;

/// Work bounds for a single invocation.
///
/// Both knobs exist to keep one invocation's wall-clock cost comfortably
/// under the host's execution-time limit. A rule whose backlog exceeds
/// `search_page_size` is only partially drained per pass and revisited the
/// next time the cursor reaches it; there is no fairness policy across
/// rules beyond that.
#[derive(Debug, Clone, Copy)]
pub struct PurgeConfig {
    /// Rule rows loaded per batch.
    pub max_batch_size: u32,
    /// Threads searched per rule.
    pub search_page_size: u32,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every rule row has been processed; the checkpoint was reset and the
    /// next invocation starts a fresh pass from the first row.
    Completed,
    /// More rows remain; the next invocation resumes at `resume_row`.
    Partial {
        /// 1-based row the next invocation starts at.
        resume_row: u32,
    },
}

/// Summary of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct PurgeReport {
    /// How the invocation ended.
    pub outcome: PassOutcome,
    /// Active rules executed.
    pub rules_processed: u32,
    /// Inactive rules skipped.
    pub rules_skipped: u32,
    /// Threads returned across all searches.
    pub threads_scanned: u32,
    /// Messages moved to trash.
    pub messages_deleted: u32,
}

/// Drives one scheduled invocation: load a batch at the checkpoint, run the
/// executor over it, then advance or reset the checkpoint.
///
/// The checkpoint is batch-granular. It is written only after every rule in
/// the batch succeeded; if a rule fails mid-batch the invocation aborts with
/// the cursor untouched, so the next run retries the whole batch. Deletions
/// already performed before the failure stand; there is no rollback.
///
/// Concurrent invocations are unsafe: two overlapping runs race the cursor
/// read-then-write and can process a batch twice or skip one. The scheduler
/// must not overlap runs; no lock is taken here.
pub struct BatchOrchestrator<R, S, M, C> {
    rules: R,
    checkpoint: CheckpointManager<S>,
    mailbox: M,
    clock: C,
    config: PurgeConfig,
}

impl<R, S, M, C> BatchOrchestrator<R, S, M, C>
where
    R: RuleStore,
    S: CheckpointStore,
    M: MessageStore,
    C: Clock,
{
    /// Creates an orchestrator with default work bounds.
    pub fn new(rules: R, checkpoint_store: S, mailbox: M, clock: C) -> Self {
        Self::with_config(rules, checkpoint_store, mailbox, clock, PurgeConfig::default())
    }

    /// Creates an orchestrator with explicit work bounds.
    pub const fn with_config(
        rules: R,
        checkpoint_store: S,
        mailbox: M,
        clock: C,
        config: PurgeConfig,
    ) -> Self {
        Self {
            rules,
            checkpoint: CheckpointManager::new(checkpoint_store),
            mailbox,
            clock,
            config,
        }
    }

    /// Runs one invocation.
    ///
    /// This is the scheduler's entry point; each call is expected to run in
    /// a fresh process on a fixed cadence.
    ///
    /// # Errors
    ///
    /// Rule-store and checkpoint-store failures abort before any mailbox
    /// work. A mailbox failure aborts the batch with the checkpoint
    /// unchanged; the next scheduled invocation retries the same batch.
    pub async fn run_once(&self) -> Result<PurgeReport> {
        info!("purge invocation start");

        let cursor = self.checkpoint.cursor().await?;
        let total_rows = self.rules.row_count().await?;
        let batch = load_batch(&self.rules, cursor, self.config.max_batch_size, total_rows).await?;

        if batch.is_empty() {
            // The cursor is already past the last row: the pass finished on
            // a prior run, or the store shrank underneath it. Start over.
            self.checkpoint.reset().await?;
            warn!(cursor, total_rows, "no rows at cursor; checkpoint reset");
            return Ok(PurgeReport {
                outcome: PassOutcome::Completed,
                rules_processed: 0,
                rules_skipped: 0,
                threads_scanned: 0,
                messages_deleted: 0,
            });
        }

        let executor =
            PurgeExecutor::new(&self.mailbox, &self.clock, self.config.search_page_size);

        let mut rules_processed = 0u32;
        let mut rules_skipped = 0u32;
        let mut threads_scanned = 0u32;
        let mut messages_deleted = 0u32;

        for rule in &batch.rules {
            let outcome = executor.run(rule).await?;
            if outcome.skipped {
                rules_skipped += 1;
            } else {
                rules_processed += 1;
                threads_scanned = threads_scanned.saturating_add(outcome.threads_scanned);
                messages_deleted = messages_deleted.saturating_add(outcome.messages_deleted);
            }
        }

        let outcome = if batch.next_cursor > total_rows {
            self.checkpoint.reset().await?;
            info!(total_rows, "full pass complete; checkpoint reset");
            PassOutcome::Completed
        } else {
            self.checkpoint.set_cursor(batch.next_cursor).await?;
            info!(resume_row = batch.next_cursor, "batch complete; checkpoint advanced");
            PassOutcome::Partial {
                resume_row: batch.next_cursor,
            }
        };

        info!(
            rules_processed,
            rules_skipped, threads_scanned, messages_deleted, "purge invocation end"
        );

        Ok(PurgeReport {
            outcome,
            rules_processed,
            rules_skipped,
            threads_scanned,
            messages_deleted,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::mailbox::MemoryMessageStore;
    use crate::rule::{RuleDraft, RuleRepository};
    use crate::time::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    async fn rules_with(count: u32) -> RuleRepository {
        let repo = RuleRepository::in_memory().await.unwrap();
        for i in 1..=count {
            let draft = RuleDraft::new(format!("rule {i}"), format!("label-{i}"), 30, false, false);
            repo.add(&draft).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_partial_then_completed_across_invocations() {
        let rules = rules_with(3).await;
        let checkpoint = MemoryCheckpointStore::new();
        let orchestrator = BatchOrchestrator::with_config(
            rules,
            checkpoint.clone(),
            MemoryMessageStore::new(),
            clock(),
            PurgeConfig {
                max_batch_size: 2,
                search_page_size: 50,
            },
        );

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.outcome, PassOutcome::Partial { resume_row: 3 });
        assert_eq!(report.rules_processed, 2);

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.outcome, PassOutcome::Completed);
        assert_eq!(report.rules_processed, 1);

        // Pass restarts from the top.
        let manager = CheckpointManager::new(checkpoint);
        assert_eq!(manager.cursor().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_rule_store_completes_immediately() {
        let orchestrator = BatchOrchestrator::new(
            rules_with(0).await,
            MemoryCheckpointStore::new(),
            MemoryMessageStore::new(),
            clock(),
        );

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.outcome, PassOutcome::Completed);
        assert_eq!(report.rules_processed, 0);
        assert_eq!(report.messages_deleted, 0);
    }

    #[tokio::test]
    async fn test_stale_cursor_past_shrunken_store_resets() {
        let rules = rules_with(2).await;
        let checkpoint = MemoryCheckpointStore::new();
        let manager = CheckpointManager::new(checkpoint.clone());
        manager.set_cursor(9).await.unwrap();

        let orchestrator = BatchOrchestrator::new(
            rules,
            checkpoint,
            MemoryMessageStore::new(),
            clock(),
        );

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.outcome, PassOutcome::Completed);
        assert_eq!(manager.cursor().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inactive_rules_counted_as_skipped() {
        let rules = RuleRepository::in_memory().await.unwrap();
        rules
            .add(&RuleDraft::new("active", "Inbox", 30, false, false))
            .await
            .unwrap();
        rules
            .add(&RuleDraft::new("no label yet", "", 30, false, false))
            .await
            .unwrap();

        let orchestrator = BatchOrchestrator::new(
            rules,
            MemoryCheckpointStore::new(),
            MemoryMessageStore::new(),
            clock(),
        );

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.rules_processed, 1);
        assert_eq!(report.rules_skipped, 1);
    }
}
