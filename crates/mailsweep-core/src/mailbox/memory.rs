//! In-memory mail archive.
//!
//! Holds a mailbox as plain data and answers the engine's search-filter
//! grammar over it. Serves as the reference implementation of the
//! [`MessageStore`](super::MessageStore) contract, the test double for the
//! engine, and the backend for snapshot-driven CLI runs; the stored types
//! serialize to and from JSON.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{MailMessage, MailThread, MailboxError, MessageStore};

/// A message held in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message subject, kept for snapshot readability.
    #[serde(default)]
    pub subject: String,
    /// Message timestamp.
    pub date: DateTime<Utc>,
    /// Whether the message is starred.
    #[serde(default)]
    pub starred: bool,
    /// Whether the message has been moved to trash.
    #[serde(default)]
    pub trashed: bool,
}

/// A conversation thread held in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredThread {
    /// Labels attached to the thread.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Whether the thread is marked important.
    #[serde(default)]
    pub important: bool,
    /// Messages in the thread, in mailbox order.
    pub messages: Vec<StoredMessage>,
}

/// In-memory [`MessageStore`] over a vector of threads.
///
/// Clones share the same underlying mailbox, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Default, Clone)]
pub struct MemoryMessageStore {
    threads: Arc<Mutex<Vec<StoredThread>>>,
}

impl MemoryMessageStore {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mailbox holding the given threads.
    #[must_use]
    pub fn from_threads(threads: Vec<StoredThread>) -> Self {
        Self {
            threads: Arc::new(Mutex::new(threads)),
        }
    }

    /// Returns a copy of the current mailbox contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredThread> {
        self.lock().clone()
    }

    /// Returns the number of trashed messages across all threads.
    #[must_use]
    pub fn trashed_count(&self) -> usize {
        self.lock()
            .iter()
            .flat_map(|t| &t.messages)
            .filter(|m| m.trashed)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredThread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Search-filter terms understood by the store.
#[derive(Debug, Default)]
struct ParsedFilter {
    label: Option<String>,
    before: Option<NaiveDate>,
    exclude_starred: bool,
    exclude_important: bool,
}

fn parse_filter(filter: &str) -> ParsedFilter {
    let mut parsed = ParsedFilter::default();
    for term in filter.split_whitespace() {
        if let Some(label) = term.strip_prefix("label:") {
            parsed.label = Some(label.to_string());
        } else if let Some(date) = term.strip_prefix("before:") {
            parsed.before = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
        } else if term == "-is:starred" {
            parsed.exclude_starred = true;
        } else if term == "-is:important" {
            parsed.exclude_important = true;
        }
        // Unknown terms are ignored, like a forgiving search backend.
    }
    parsed
}

/// A thread matches when some untrashed message satisfies every
/// message-level term; `-is:important` excludes the whole thread.
fn thread_matches(thread: &StoredThread, filter: &ParsedFilter) -> bool {
    if filter.exclude_important && thread.important {
        return false;
    }
    if let Some(label) = &filter.label {
        if !thread.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            return false;
        }
    }
    thread.messages.iter().any(|m| message_matches(m, filter))
}

fn message_matches(message: &StoredMessage, filter: &ParsedFilter) -> bool {
    !message.trashed
        && !(filter.exclude_starred && message.starred)
        && filter.before.is_none_or(|d| message.date.date_naive() < d)
}

/// Handle to a thread inside a [`MemoryMessageStore`].
#[derive(Debug, Clone)]
pub struct MemoryThread {
    threads: Arc<Mutex<Vec<StoredThread>>>,
    index: usize,
}

impl MemoryThread {
    fn lock(&self) -> MutexGuard<'_, Vec<StoredThread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MailThread for MemoryThread {
    type Message = MemoryMessage;

    fn is_important(&self) -> bool {
        self.lock().get(self.index).is_some_and(|t| t.important)
    }

    async fn messages(&self) -> Result<Vec<MemoryMessage>, MailboxError> {
        let count = self
            .lock()
            .get(self.index)
            .map_or(0, |t| t.messages.len());

        Ok((0..count)
            .map(|message_index| MemoryMessage {
                threads: Arc::clone(&self.threads),
                thread_index: self.index,
                message_index,
            })
            .collect())
    }
}

/// Handle to a message inside a [`MemoryMessageStore`].
#[derive(Debug, Clone)]
pub struct MemoryMessage {
    threads: Arc<Mutex<Vec<StoredThread>>>,
    thread_index: usize,
    message_index: usize,
}

impl MemoryMessage {
    fn lock(&self) -> MutexGuard<'_, Vec<StoredThread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl Fn(&StoredMessage) -> T, fallback: T) -> T {
        self.lock()
            .get(self.thread_index)
            .and_then(|t| t.messages.get(self.message_index))
            .map_or(fallback, f)
    }
}

impl MailMessage for MemoryMessage {
    fn is_starred(&self) -> bool {
        self.read(|m| m.starred, false)
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.read(|m| m.date, DateTime::<Utc>::MIN_UTC)
    }

    async fn move_to_trash(&self) -> Result<(), MailboxError> {
        let mut threads = self.lock();
        let message = threads
            .get_mut(self.thread_index)
            .and_then(|t| t.messages.get_mut(self.message_index))
            .ok_or_else(|| MailboxError::Delete("message no longer exists".to_string()))?;
        message.trashed = true;
        Ok(())
    }
}

impl MessageStore for MemoryMessageStore {
    type Thread = MemoryThread;

    async fn search(
        &self,
        filter: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MemoryThread>, MailboxError> {
        let parsed = parse_filter(filter);
        let matching: Vec<usize> = {
            let threads = self.lock();
            threads
                .iter()
                .enumerate()
                .filter(|(_, t)| thread_matches(t, &parsed))
                .map(|(i, _)| i)
                .collect()
        };

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|index| MemoryThread {
                threads: Arc::clone(&self.threads),
                index,
            })
            .collect())
    }
}
