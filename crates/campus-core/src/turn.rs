//! Turn state: the record threaded through one user question.
//!
//! A [`TurnState`] lives for exactly one user message. Each phase of the
//! query loop owns a subset of its fields:
//!
//! | Field             | Written by                                       |
//! |-------------------|--------------------------------------------------|
//! | `question`        | nobody (set at construction)                     |
//! | `history`         | GENERATE (query entries), ANSWER (answer)        |
//! | `candidate_query` | GENERATE                                         |
//! | `results`         | GENERATE and retry branch (cleared), EXECUTE     |
//! | `verdict`         | GENERATE and retry branch (cleared), VALIDATE    |
//! | `attempt_count`   | GENERATE                                         |

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::message::Message;

/// Hard ceiling on generation attempts within a single turn.
pub const MAX_ATTEMPTS: u32 = 3;

/// The token a validator verdict must contain to be accepted.
pub const ACCEPT_TOKEN: &str = "VALID";

// ─── Results ─────────────────────────────────────────────────────────────────

/// One result row: column name → value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// What the most recent execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
  /// Rows returned by the executor. An empty vector is also the cleared state.
  Rows(Vec<Row>),
  /// The executor could not run the statement.
  Failed { error: String },
  /// No statement was run because the generator returned the sentinel.
  ChatMode,
}

impl Default for QueryResults {
  fn default() -> Self { Self::Rows(Vec::new()) }
}

impl QueryResults {
  pub fn failed(error: impl Into<String>) -> Self {
    Self::Failed { error: error.into() }
  }

  pub fn is_chat_mode(&self) -> bool { matches!(self, Self::ChatMode) }

  /// Number of data rows; zero for failures and chat-mode.
  pub fn row_count(&self) -> usize {
    match self {
      Self::Rows(rows) => rows.len(),
      _ => 0,
    }
  }

  /// The sequence-of-mappings form shown to the models.
  pub fn to_json(&self) -> Value {
    match self {
      Self::Rows(rows) => {
        Value::Array(rows.iter().cloned().map(Value::Object).collect())
      }
      Self::Failed { error } => json!([{ "error": error }]),
      Self::ChatMode => json!([{ "chat_mode": true }]),
    }
  }
}

impl Serialize for QueryResults {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.to_json().serialize(serializer)
  }
}

// ─── Grading ─────────────────────────────────────────────────────────────────

/// The branch taken after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
  Happy,
  TryAgain,
  GiveUp,
}

/// Whether a free-text verdict accepts the results.
///
/// The verdict is accepted when [`ACCEPT_TOKEN`] appears as a standalone word,
/// compared case-insensitively. Word boundaries are any characters other than
/// alphanumerics and `_`, so `"INVALID: wrong university"` is a rejection.
pub fn verdict_accepts(verdict: &str) -> bool {
  verdict
    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    .any(|word| word.eq_ignore_ascii_case(ACCEPT_TOKEN))
}

/// Decide the next branch. Acceptance is checked before the attempt ceiling,
/// so a valid verdict always wins.
pub fn grade(verdict: &str, attempt_count: u32) -> Grade {
  if verdict_accepts(verdict) {
    Grade::Happy
  } else if attempt_count >= MAX_ATTEMPTS {
    Grade::GiveUp
  } else {
    Grade::TryAgain
  }
}

// ─── Turn state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TurnState {
  pub question:        String,
  pub history:         Vec<Message>,
  pub candidate_query: String,
  pub results:         QueryResults,
  pub verdict:         String,
  pub attempt_count:   u32,
}

impl TurnState {
  /// Start a turn. `attempt_count` always begins at zero.
  pub fn new(question: impl Into<String>, history: Vec<Message>) -> Self {
    Self {
      question: question.into(),
      history,
      candidate_query: String::new(),
      results: QueryResults::default(),
      verdict: String::new(),
      attempt_count: 0,
    }
  }

  /// Fold a freshly generated query into the state.
  ///
  /// On the first attempt both the question and the query are appended to
  /// history; later attempts append only the query. Results and verdict are
  /// cleared so nothing from a previous attempt leaks into this one.
  pub fn record_generation(&mut self, query: String) {
    if self.attempt_count == 0 {
      self.history.push(Message::user(self.question.clone()));
    }
    self.history.push(Message::assistant(query.clone()));
    self.candidate_query = query;
    self.attempt_count += 1;
    self.clear_attempt();
  }

  /// Drop the results and verdict of the attempt just graded.
  pub fn clear_attempt(&mut self) {
    self.results = QueryResults::default();
    self.verdict.clear();
  }

  pub fn grade(&self) -> Grade { grade(&self.verdict, self.attempt_count) }
}
