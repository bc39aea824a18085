//! Cross-component purge scenarios: rules, checkpoint, mailbox, and the
//! orchestrator working together across invocations.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;

use mailsweep_core::mailbox::memory::MemoryThread;
use mailsweep_core::{
    BatchOrchestrator, CheckpointManager, FixedClock, MailboxError, MemoryCheckpointStore,
    MemoryMessageStore, MessageStore, PassOutcome, PurgeConfig, RuleDraft, RuleRepository,
    StoredMessage, StoredThread,
};

fn clock() -> FixedClock {
    FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
}

fn message(date: &str, starred: bool) -> StoredMessage {
    StoredMessage {
        subject: String::new(),
        date: format!("{date}T10:00:00Z").parse().unwrap(),
        starred,
        trashed: false,
    }
}

fn thread(label: &str, messages: Vec<StoredMessage>) -> StoredThread {
    StoredThread {
        labels: vec![label.to_string()],
        important: false,
        messages,
    }
}

/// Records every filter passed to search, delegating to the memory store.
struct RecordingStore {
    inner: MemoryMessageStore,
    filters: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    fn new(inner: MemoryMessageStore) -> (Self, Arc<Mutex<Vec<String>>>) {
        let filters = Arc::new(Mutex::new(Vec::new()));
        let store = Self {
            inner,
            filters: Arc::clone(&filters),
        };
        (store, filters)
    }
}

impl MessageStore for RecordingStore {
    type Thread = MemoryThread;

    async fn search(
        &self,
        filter: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MemoryThread>, MailboxError> {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filter.to_string());
        self.inner.search(filter, offset, limit).await
    }
}

/// Fails any search whose filter mentions the given label.
struct FlakyStore {
    inner: MemoryMessageStore,
    fail_label: String,
}

impl MessageStore for FlakyStore {
    type Thread = MemoryThread;

    async fn search(
        &self,
        filter: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MemoryThread>, MailboxError> {
        if filter.contains(&self.fail_label) {
            return Err(MailboxError::Search("quota exceeded".to_string()));
        }
        self.inner.search(filter, offset, limit).await
    }
}

#[tokio::test]
async fn end_to_end_starred_survive_old_mail_is_trashed() {
    let rules = RuleRepository::in_memory().await.unwrap();
    rules
        .add(&RuleDraft::new("clean inbox", "Inbox", 30, true, false))
        .await
        .unwrap();

    let mailbox = MemoryMessageStore::from_threads(vec![
        thread("Inbox", vec![message("2023-12-01", false)]),
        thread("Inbox", vec![message("2023-12-01", true)]),
    ]);

    let orchestrator =
        BatchOrchestrator::new(rules, MemoryCheckpointStore::new(), mailbox.clone(), clock());
    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.rules_processed, 1);
    assert_eq!(report.messages_deleted, 1);

    // today 2024-02-01 minus 30 days
    let snapshot = mailbox.snapshot();
    assert!(snapshot[0].messages[0].trashed);
    assert!(!snapshot[1].messages[0].trashed);
}

#[tokio::test]
async fn filter_built_for_rule_matches_contract() {
    let rules = RuleRepository::in_memory().await.unwrap();
    rules
        .add(&RuleDraft::new("clean inbox", "Inbox", 30, true, false))
        .await
        .unwrap();

    let (store, filters) = RecordingStore::new(MemoryMessageStore::new());
    let orchestrator = BatchOrchestrator::new(
        rules,
        MemoryCheckpointStore::new(),
        store,
        clock(),
    );

    orchestrator.run_once().await.unwrap();

    let filters = filters.lock().unwrap_or_else(PoisonError::into_inner);
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0], "label:Inbox before:2024-01-02 -is:starred");
}

#[tokio::test]
async fn completion_resets_checkpoint_and_next_pass_restarts() {
    let rules = RuleRepository::in_memory().await.unwrap();
    for label in ["One", "Two", "Three"] {
        rules
            .add(&RuleDraft::new("pass rule", label, 30, false, false))
            .await
            .unwrap();
    }

    let checkpoint = MemoryCheckpointStore::new();
    let orchestrator = BatchOrchestrator::new(
        rules,
        checkpoint.clone(),
        MemoryMessageStore::new(),
        clock(),
    );

    let report = orchestrator.run_once().await.unwrap();
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.rules_processed, 3);

    let manager = CheckpointManager::new(checkpoint);
    assert_eq!(manager.cursor().await.unwrap(), 1);

    // The next invocation starts a fresh pass over all rows.
    let report = orchestrator.run_once().await.unwrap();
    assert_eq!(report.rules_processed, 3);
}

#[tokio::test]
async fn resumed_invocation_continues_where_the_last_stopped() {
    let rules = RuleRepository::in_memory().await.unwrap();
    let mut threads = Vec::new();
    for i in 1..=4 {
        let label = format!("label-{i}");
        rules
            .add(&RuleDraft::new("rule", &label, 30, false, false))
            .await
            .unwrap();
        threads.push(thread(&label, vec![message("2023-12-01", false)]));
    }

    let mailbox = MemoryMessageStore::from_threads(threads);
    let orchestrator = BatchOrchestrator::with_config(
        rules,
        MemoryCheckpointStore::new(),
        mailbox.clone(),
        clock(),
        PurgeConfig {
            max_batch_size: 2,
            search_page_size: 50,
        },
    );

    orchestrator.run_once().await.unwrap();
    let snapshot = mailbox.snapshot();
    assert!(snapshot[0].messages[0].trashed);
    assert!(snapshot[1].messages[0].trashed);
    assert!(!snapshot[2].messages[0].trashed);

    orchestrator.run_once().await.unwrap();
    let snapshot = mailbox.snapshot();
    assert!(snapshot[2].messages[0].trashed);
    assert!(snapshot[3].messages[0].trashed);
}

#[tokio::test]
async fn mid_batch_failure_leaves_checkpoint_and_earlier_deletions() {
    let rules = RuleRepository::in_memory().await.unwrap();
    let mut threads = Vec::new();
    for i in 1..=5 {
        let label = format!("label-{i}");
        rules
            .add(&RuleDraft::new("rule", &label, 30, false, false))
            .await
            .unwrap();
        threads.push(thread(&label, vec![message("2023-12-01", false)]));
    }

    let mailbox = MemoryMessageStore::from_threads(threads);
    let checkpoint = MemoryCheckpointStore::new();
    let orchestrator = BatchOrchestrator::new(
        rules,
        checkpoint.clone(),
        FlakyStore {
            inner: mailbox.clone(),
            fail_label: "label-3".to_string(),
        },
        clock(),
    );

    let err = orchestrator.run_once().await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));

    // Checkpoint never advanced: the whole batch is retried next run.
    let manager = CheckpointManager::new(checkpoint);
    assert_eq!(manager.cursor().await.unwrap(), 1);

    // Deletions made before the failure are not rolled back.
    let snapshot = mailbox.snapshot();
    assert!(snapshot[0].messages[0].trashed);
    assert!(snapshot[1].messages[0].trashed);
    assert!(!snapshot[2].messages[0].trashed);
    assert!(!snapshot[3].messages[0].trashed);
    assert_eq!(mailbox.trashed_count(), 2);
}
