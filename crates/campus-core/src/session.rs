//! Sessions: keys, in-memory history storage, and the per-session turn
//! service.
//!
//! [`Assistant`] is the boundary between a connected client and the query
//! loop. It serialises turns per session key, reads the stored history, runs
//! the loop, and writes the extended history back exactly once when the turn
//! succeeds. A failed turn writes nothing. Ending a session takes the same
//! per-key lock, so it is ordered after any turn already running.

use std::{
  collections::HashMap,
  fmt,
  future::Future,
  sync::{Arc, Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  engine::{QueryLoop, TurnOutcome},
  message::Message,
  ports::{LanguageModel, ProgressSink, QueryExecutor, SessionMemory},
};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Opaque identifier for one client conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
  pub fn new(key: impl Into<String>) -> Self { Self(key.into()) }

  /// Mint a fresh random key.
  pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for SessionKey {
  fn from(s: String) -> Self { Self(s) }
}

// ─── In-memory storage ───────────────────────────────────────────────────────

/// Process-local [`SessionMemory`]. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemorySessions {
  histories: RwLock<HashMap<SessionKey, Vec<Message>>>,
}

impl InMemorySessions {
  pub fn new() -> Self { Self::default() }

  /// Number of sessions with stored history.
  pub fn len(&self) -> usize {
    self.histories.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl SessionMemory for InMemorySessions {
  async fn history(&self, key: &SessionKey) -> Vec<Message> {
    self
      .histories
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
      .unwrap_or_default()
  }

  async fn store(&self, key: SessionKey, history: Vec<Message>) {
    self
      .histories
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, history);
  }

  async fn forget(&self, key: &SessionKey) -> bool {
    self
      .histories
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key)
      .is_some()
  }
}

// ─── Conversation service ────────────────────────────────────────────────────

/// What the transport layer needs from the assistant.
///
/// Implemented by [`Assistant`]; the HTTP crate is generic over this trait so
/// it can be tested without models or a database.
pub trait Conversation: Send + Sync {
  /// Run one turn for `key` and commit its history on success.
  fn ask(
    &self,
    key: SessionKey,
    question: String,
    sink: &dyn ProgressSink,
  ) -> impl Future<Output = Result<TurnOutcome>> + Send;

  /// The committed history for `key` (empty if unseen).
  fn history(&self, key: &SessionKey) -> impl Future<Output = Vec<Message>> + Send;

  /// Tear down a session. Returns whether it had any history.
  fn end_session(&self, key: &SessionKey) -> impl Future<Output = bool> + Send;
}

type TurnLock = Arc<tokio::sync::Mutex<()>>;

/// The query loop bound to a session store.
pub struct Assistant<G, V, E, M = InMemorySessions> {
  engine: QueryLoop<G, V, E>,
  memory: M,
  turns:  Mutex<HashMap<SessionKey, TurnLock>>,
}

impl<G, V, E, M> Assistant<G, V, E, M>
where
  G: LanguageModel,
  V: LanguageModel,
  E: QueryExecutor,
  M: SessionMemory,
{
  pub fn new(engine: QueryLoop<G, V, E>, memory: M) -> Self {
    Self { engine, memory, turns: Mutex::new(HashMap::new()) }
  }

  pub fn memory(&self) -> &M { &self.memory }

  /// The lock serialising turns for `key`, created on first use.
  fn turn_lock(&self, key: &SessionKey) -> TurnLock {
    self
      .turns
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(key.clone())
      .or_default()
      .clone()
  }
}

impl<G, V, E, M> Conversation for Assistant<G, V, E, M>
where
  G: LanguageModel,
  V: LanguageModel,
  E: QueryExecutor,
  M: SessionMemory,
{
  async fn ask(
    &self,
    key: SessionKey,
    question: String,
    sink: &dyn ProgressSink,
  ) -> Result<TurnOutcome> {
    let question = question.trim();
    if question.is_empty() {
      return Err(Error::EmptyQuestion);
    }

    let lock = self.turn_lock(&key);
    let _turn = lock.lock().await;
    debug!(session = %key, "turn lock acquired");

    let history = self.memory.history(&key).await;
    let outcome = self.engine.run(question, history, sink).await?;

    self.memory.store(key.clone(), outcome.history.clone()).await;
    info!(session = %key, history_len = outcome.history.len(), "history committed");
    Ok(outcome)
  }

  async fn history(&self, key: &SessionKey) -> Vec<Message> {
    self.memory.history(key).await
  }

  async fn end_session(&self, key: &SessionKey) -> bool {
    // Ordered after any in-flight turn on this key.
    let lock = self.turn_lock(key);
    let _turn = lock.lock().await;
    let existed = self.memory.forget(key).await;

    // Keep the entry while a queued turn still holds a clone of it.
    let mut turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);
    if turns.get(key).is_some_and(|held| Arc::ptr_eq(held, &lock))
      && Arc::strong_count(&lock) == 2
    {
      turns.remove(key);
    }
    drop(turns);

    info!(session = %key, existed, "session ended");
    existed
  }
}
