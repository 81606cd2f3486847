//! The seams between the query loop and the outside world.
//!
//! Adapters (`campus-llm`, `campus-store-sqlite`) implement these traits; the
//! loop and the HTTP layer depend only on the abstractions.
//!
//! All async methods return `Send` futures so implementations can be driven
//! from a multi-threaded tokio runtime behind `axum`.

use std::{future::Future, sync::{Arc, Mutex, PoisonError}};

use tokio::sync::mpsc::UnboundedSender;

use crate::{
  message::Message,
  progress::Progress,
  session::SessionKey,
  turn::QueryResults,
};

// ─── Language models ─────────────────────────────────────────────────────────

/// A text-completion capability. Both the generator and the validator are
/// instances of this trait; each call is independent of every other.
pub trait LanguageModel: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Complete a conversation and return the raw response text.
  fn complete(
    &self,
    messages: &[Message],
  ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

impl<T: LanguageModel> LanguageModel for Arc<T> {
  type Error = T::Error;

  fn complete(
    &self,
    messages: &[Message],
  ) -> impl Future<Output = Result<String, Self::Error>> + Send {
    (**self).complete(messages)
  }
}

// ─── Query executor ──────────────────────────────────────────────────────────

/// Runs one read-only statement.
///
/// Never fails from the caller's point of view: storage errors, write
/// attempts, and malformed SQL all come back as [`QueryResults::Failed`].
pub trait QueryExecutor: Send + Sync {
  fn execute(&self, sql: &str) -> impl Future<Output = QueryResults> + Send;
}

impl<T: QueryExecutor> QueryExecutor for Arc<T> {
  fn execute(&self, sql: &str) -> impl Future<Output = QueryResults> + Send {
    (**self).execute(sql)
  }
}

// ─── Session memory ──────────────────────────────────────────────────────────

/// Per-session conversation history.
///
/// Histories of different sessions are fully isolated. Callers serialise
/// turns per key; implementations need not guard against two writers on the
/// same key.
pub trait SessionMemory: Send + Sync {
  /// The stored history, or an empty vector for an unseen key.
  fn history(&self, key: &SessionKey) -> impl Future<Output = Vec<Message>> + Send;

  /// Replace the stored history for `key`.
  fn store(
    &self,
    key: SessionKey,
    history: Vec<Message>,
  ) -> impl Future<Output = ()> + Send;

  /// Drop the history for `key`. Returns whether anything was stored.
  fn forget(&self, key: &SessionKey) -> impl Future<Output = bool> + Send;
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// Observer invoked at each phase boundary of a turn.
pub trait ProgressSink: Send + Sync {
  fn notify(&self, progress: Progress);
}

/// Discards every notification.
impl ProgressSink for () {
  fn notify(&self, _progress: Progress) {}
}

/// Forwards to a channel; a dropped receiver (e.g. a disconnected client) is
/// not an error.
impl ProgressSink for UnboundedSender<Progress> {
  fn notify(&self, progress: Progress) {
    let _ = self.send(progress);
  }
}

/// Records notifications in order.
impl ProgressSink for Mutex<Vec<Progress>> {
  fn notify(&self, progress: Progress) {
    self.lock().unwrap_or_else(PoisonError::into_inner).push(progress);
  }
}
