//! Per-rule purge execution.

use tracing::{debug, info};

use super::query::build_search_filter;
use crate::Result;
use crate::mailbox::{MailMessage, MailThread, MessageStore};
use crate::rule::RetentionRule;
use crate::time::Clock;

/// What one rule's execution did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Threads returned by the search.
    pub threads_scanned: u32,
    /// Messages moved to trash.
    pub messages_deleted: u32,
    /// True when the rule was inactive and nothing was searched.
    pub skipped: bool,
}

impl RuleOutcome {
    /// Outcome for an inactive rule: no search issued, nothing touched.
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            threads_scanned: 0,
            messages_deleted: 0,
            skipped: true,
        }
    }
}

/// Applies one retention rule to the mailbox.
///
/// Searches and deletions run sequentially in mailbox order, so results are
/// reproducible given the same external state. The first mailbox failure
/// propagates immediately; the caller decides what that aborts.
pub struct PurgeExecutor<'a, M, C> {
    mailbox: &'a M,
    clock: &'a C,
    page_size: u32,
}

impl<'a, M: MessageStore, C: Clock> PurgeExecutor<'a, M, C> {
    /// Creates an executor over the given mailbox and clock.
    ///
    /// `page_size` caps how many threads one rule may touch per invocation.
    pub const fn new(mailbox: &'a M, clock: &'a C, page_size: u32) -> Self {
        Self {
            mailbox,
            clock,
            page_size,
        }
    }

    /// Runs one rule against the mailbox.
    ///
    /// Inactive rules return a no-op outcome without touching the mailbox.
    /// Active rules search with the rule's exclusion flags applied at the
    /// query level, then re-check every thread and message against the same
    /// flags and the cutoff date before trashing: the query-level and
    /// store-level notions of "starred" and "important" are not guaranteed
    /// to be identical.
    ///
    /// # Errors
    ///
    /// Any mailbox failure (search, listing, trash) propagates unchanged.
    pub async fn run(&self, rule: &RetentionRule) -> Result<RuleOutcome> {
        if !rule.is_active() {
            debug!(row = rule.row, "skipping inactive rule");
            return Ok(RuleOutcome::skipped());
        }

        let cutoff = rule.cutoff_date(self.clock.today());
        let filter =
            build_search_filter(&rule.label, cutoff, rule.leave_starred, rule.leave_important);
        debug!(row = rule.row, filter = %filter, "searching mailbox");

        let threads = self.mailbox.search(&filter, 0, self.page_size).await?;
        let threads_scanned = u32::try_from(threads.len()).unwrap_or(u32::MAX);

        let mut messages_deleted = 0u32;
        for thread in &threads {
            if rule.leave_important && thread.is_important() {
                continue;
            }

            for message in thread.messages().await? {
                if rule.leave_starred && message.is_starred() {
                    continue;
                }
                // Thread-level dates can differ from message-level dates;
                // the query's date term alone is not enough.
                if message.timestamp().date_naive() >= cutoff {
                    continue;
                }
                message.move_to_trash().await?;
                messages_deleted += 1;
            }
        }

        info!(
            row = rule.row,
            label = %rule.label,
            threads = threads_scanned,
            deleted = messages_deleted,
            "rule applied"
        );

        Ok(RuleOutcome {
            threads_scanned,
            messages_deleted,
            skipped: false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::mailbox::memory::{MemoryMessageStore, MemoryThread, StoredMessage, StoredThread};
    use crate::mailbox::MailboxError;
    use crate::time::FixedClock;

    fn rule(label: &str, days: u32, leave_starred: bool, leave_important: bool) -> RetentionRule {
        RetentionRule {
            row: 1,
            notes: "test rule".to_string(),
            label: label.to_string(),
            retention_period_days: days,
            leave_starred,
            leave_important,
        }
    }

    fn message(date: &str, starred: bool) -> StoredMessage {
        StoredMessage {
            subject: String::new(),
            date: format!("{date}T10:00:00Z").parse().unwrap(),
            starred,
            trashed: false,
        }
    }

    fn clock() -> FixedClock {
        FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    /// Wraps the memory store to count search calls.
    struct CountingStore {
        inner: MemoryMessageStore,
        searches: AtomicUsize,
    }

    impl MessageStore for CountingStore {
        type Thread = MemoryThread;

        async fn search(
            &self,
            filter: &str,
            offset: u32,
            limit: u32,
        ) -> std::result::Result<Vec<MemoryThread>, MailboxError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.inner.search(filter, offset, limit).await
        }
    }

    #[tokio::test]
    async fn test_inactive_rule_never_searches() {
        let store = CountingStore {
            inner: MemoryMessageStore::new(),
            searches: AtomicUsize::new(0),
        };
        let clock = clock();
        let executor = PurgeExecutor::new(&store, &clock, 50);

        let mut blank_label = rule("", 30, true, true);
        blank_label.notes = "still has notes".to_string();
        let outcome = executor.run(&blank_label).await.unwrap();
        assert!(outcome.skipped);

        let mut blank_notes = rule("Inbox", 30, false, false);
        blank_notes.notes = String::new();
        let outcome = executor.run(&blank_notes).await.unwrap();
        assert!(outcome.skipped);

        assert_eq!(store.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deletes_only_old_unstarred_messages() {
        let store = MemoryMessageStore::from_threads(vec![StoredThread {
            labels: vec!["Inbox".to_string()],
            important: false,
            messages: vec![
                message("2023-12-01", false), // old: deleted
                message("2023-12-01", true),  // old but starred: kept
                message("2024-01-15", false), // newer than cutoff: kept
            ],
        }]);
        let clock = clock();
        let executor = PurgeExecutor::new(&store, &clock, 50);

        // today 2024-02-01, 30 days => cutoff 2024-01-02
        let outcome = executor.run(&rule("Inbox", 30, true, false)).await.unwrap();
        assert_eq!(outcome.threads_scanned, 1);
        assert_eq!(outcome.messages_deleted, 1);

        let snapshot = store.snapshot();
        assert!(snapshot[0].messages[0].trashed);
        assert!(!snapshot[0].messages[1].trashed);
        assert!(!snapshot[0].messages[2].trashed);
    }

    #[tokio::test]
    async fn test_important_thread_skipped_whole() {
        let store = MemoryMessageStore::from_threads(vec![
            StoredThread {
                labels: vec!["Inbox".to_string()],
                important: true,
                messages: vec![message("2023-01-01", false)],
            },
            StoredThread {
                labels: vec!["Inbox".to_string()],
                important: false,
                messages: vec![message("2023-01-01", false)],
            },
        ]);
        let clock = clock();
        let executor = PurgeExecutor::new(&store, &clock, 50);

        let outcome = executor
            .run(&rule("Inbox", 30, false, true))
            .await
            .unwrap();
        assert_eq!(outcome.messages_deleted, 1);

        let snapshot = store.snapshot();
        assert!(!snapshot[0].messages[0].trashed);
        assert!(snapshot[1].messages[0].trashed);
    }

    #[tokio::test]
    async fn test_date_recheck_guards_mixed_threads() {
        // The whole thread matches the search because one message is old,
        // but only the old message may be trashed.
        let store = MemoryMessageStore::from_threads(vec![StoredThread {
            labels: vec!["Inbox".to_string()],
            important: false,
            messages: vec![message("2023-11-01", false), message("2024-01-20", false)],
        }]);
        let clock = clock();
        let executor = PurgeExecutor::new(&store, &clock, 50);

        let outcome = executor
            .run(&rule("Inbox", 30, false, false))
            .await
            .unwrap();
        assert_eq!(outcome.messages_deleted, 1);

        let snapshot = store.snapshot();
        assert!(snapshot[0].messages[0].trashed);
        assert!(!snapshot[0].messages[1].trashed);
    }

    #[tokio::test]
    async fn test_page_size_caps_threads_per_invocation() {
        let threads: Vec<StoredThread> = (0..5)
            .map(|_| StoredThread {
                labels: vec!["Inbox".to_string()],
                important: false,
                messages: vec![message("2023-01-01", false)],
            })
            .collect();
        let store = MemoryMessageStore::from_threads(threads);
        let clock = clock();
        let executor = PurgeExecutor::new(&store, &clock, 2);

        let outcome = executor
            .run(&rule("Inbox", 30, false, false))
            .await
            .unwrap();
        assert_eq!(outcome.threads_scanned, 2);
        assert_eq!(outcome.messages_deleted, 2);
        assert_eq!(store.trashed_count(), 2);
    }
}
