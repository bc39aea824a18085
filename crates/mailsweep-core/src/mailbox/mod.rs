//! Mailbox abstraction: the external mail archive the engine purges.
//!
//! The engine only needs query-based thread search and per-message trash
//! operations; everything else about the mail backend stays behind these
//! traits. A production backend (IMAP, a provider HTTP API) plugs in here.
//! [`memory::MemoryMessageStore`] is the in-tree implementation: the
//! reference semantics for the search-filter grammar and the backend for
//! snapshot-driven runs and tests.

pub mod memory;

pub use memory::{MemoryMessageStore, StoredMessage, StoredThread};

use chrono::{DateTime, Utc};

/// Errors that can occur during mailbox operations.
///
/// All of these are fatal to the current invocation: the engine does not
/// retry inside a run, it defers to the next scheduled one.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// Search query failed.
    #[error("Search failed: {0}")]
    Search(String),

    /// Trashing a message failed.
    #[error("Delete failed: {0}")]
    Delete(String),

    /// The mailbox cannot be reached at all.
    #[error("Mailbox unavailable: {0}")]
    Unavailable(String),
}

/// A single mail message within a thread.
#[allow(async_fn_in_trait)]
pub trait MailMessage {
    /// Whether the message is starred.
    fn is_starred(&self) -> bool;

    /// The message's timestamp.
    ///
    /// Individual messages in a thread can carry different timestamps than
    /// the thread itself, which is why the engine re-checks dates here even
    /// after a date-filtered search.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Moves the message to trash (soft delete).
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox rejects the operation.
    async fn move_to_trash(&self) -> Result<(), MailboxError>;
}

/// A conversation thread.
#[allow(async_fn_in_trait)]
pub trait MailThread {
    /// The message type this thread yields.
    type Message: MailMessage;

    /// Whether the thread is marked important.
    fn is_important(&self) -> bool;

    /// All messages in the thread, in mailbox order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox rejects the listing.
    async fn messages(&self) -> Result<Vec<Self::Message>, MailboxError>;
}

/// Query-based access to the mail archive.
#[allow(async_fn_in_trait)]
pub trait MessageStore {
    /// The thread type search results yield.
    type Thread: MailThread;

    /// Searches for threads matching `filter`, returning at most `limit`
    /// threads starting at `offset`, in mailbox order.
    ///
    /// The filter grammar is the one [`crate::purge::build_search_filter`]
    /// emits: `label:<label>`, `before:<YYYY-MM-DD>`, `-is:starred`,
    /// `-is:important`, space-separated.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    async fn search(
        &self,
        filter: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Self::Thread>, MailboxError>;
}
