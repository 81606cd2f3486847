//! The self-correcting query loop.
//!
//! ```text
//! GENERATE ─► EXECUTE ─► VALIDATE ─┬─ happy ─────► ANSWER
//!    ▲                              ├─ give_up ───► ANSWER
//!    └──────── try_again ───────────┘
//! ```
//!
//! One [`QueryLoop::run`] call handles one user question from start to final
//! answer. Phases run strictly in sequence. A model failure aborts the turn;
//! executor failures are ordinary results that feed the retry branch.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, ModelRole, Result,
  message::Message,
  ports::{LanguageModel, ProgressSink, QueryExecutor},
  progress::Progress,
  prompt,
  sql::{is_no_query, strip_code_fences},
  turn::{ACCEPT_TOKEN, Grade, QueryResults, TurnState},
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Everything a completed turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
  pub answer:   String,
  /// The session history extended with this turn's entries.
  pub history:  Vec<Message>,
  pub attempts: u32,
  /// The branch that led to the answer: `happy` or `give_up`.
  pub grade:    Grade,
  /// The last candidate query (possibly the no-query sentinel).
  pub query:    String,
  pub results:  QueryResults,
}

// ─── Loop ────────────────────────────────────────────────────────────────────

/// Generator → executor → validator → answer, with bounded retries.
///
/// The three collaborators are injected at construction; the loop keeps no
/// state between turns.
pub struct QueryLoop<G, V, E> {
  generator: G,
  validator: V,
  executor:  E,
}

impl<G, V, E> QueryLoop<G, V, E>
where
  G: LanguageModel,
  V: LanguageModel,
  E: QueryExecutor,
{
  pub fn new(generator: G, validator: V, executor: E) -> Self {
    Self { generator, validator, executor }
  }

  /// Run one turn to completion.
  ///
  /// `history` is the session's prior conversation; the extended copy is
  /// returned in the [`TurnOutcome`]. On error nothing is returned, so the
  /// caller's stored history stays as it was.
  pub async fn run(
    &self,
    question: &str,
    history: Vec<Message>,
    sink: &dyn ProgressSink,
  ) -> Result<TurnOutcome> {
    let mut state = TurnState::new(question, history);
    info!(question, prior_messages = state.history.len(), "turn started");

    let grade = loop {
      self.generate(&mut state).await?;
      sink.notify(Progress::Generating {
        attempt: state.attempt_count,
        query:   state.candidate_query.clone(),
      });

      self.execute(&mut state).await;
      sink.notify(Progress::Executing { attempt: state.attempt_count });

      self.validate(&mut state).await?;
      let grade = state.grade();
      sink.notify(Progress::validating(state.attempt_count, grade, &state.verdict));

      debug!(attempt = state.attempt_count, ?grade, "attempt graded");
      match grade {
        Grade::TryAgain => state.clear_attempt(),
        Grade::Happy | Grade::GiveUp => break grade,
      }
    };

    if grade == Grade::GiveUp {
      warn!(attempts = state.attempt_count, verdict = %state.verdict, "giving up on query");
    }

    let answer = self.answer(&mut state).await?;
    info!(attempts = state.attempt_count, ?grade, "turn finished");

    Ok(TurnOutcome {
      answer,
      history: state.history,
      attempts: state.attempt_count,
      grade,
      query: state.candidate_query,
      results: state.results,
    })
  }

  // ── Phases ────────────────────────────────────────────────────────────────

  /// GENERATE: draft a query and fold it into the state.
  async fn generate(&self, state: &mut TurnState) -> Result<()> {
    let request =
      prompt::generation_request(&state.results, &state.history, &state.question);
    let raw = self
      .generator
      .complete(&request)
      .await
      .map_err(|e| Error::model(ModelRole::Generator, e))?;

    let query = strip_code_fences(&raw);
    debug!(attempt = state.attempt_count + 1, %query, "query drafted");
    state.record_generation(query);
    Ok(())
  }

  /// EXECUTE: run the candidate, or mark the turn as chat-mode.
  async fn execute(&self, state: &mut TurnState) {
    state.results = if is_no_query(&state.candidate_query) {
      debug!("no-query sentinel, skipping execution");
      QueryResults::ChatMode
    } else {
      self.executor.execute(&state.candidate_query).await
    };

    match &state.results {
      QueryResults::Failed { error } => debug!(%error, "query failed"),
      results => debug!(rows = results.row_count(), "query executed"),
    }
  }

  /// VALIDATE: chat-mode is accepted outright; everything else is judged.
  async fn validate(&self, state: &mut TurnState) -> Result<()> {
    state.verdict = if state.results.is_chat_mode() {
      ACCEPT_TOKEN.to_owned()
    } else {
      let request = prompt::validation_request(
        &state.question,
        &state.candidate_query,
        &state.results,
      );
      self
        .validator
        .complete(&request)
        .await
        .map_err(|e| Error::model(ModelRole::Validator, e))?
    };
    Ok(())
  }

  /// ANSWER: synthesise the reply and append it to history.
  async fn answer(&self, state: &mut TurnState) -> Result<String> {
    let request =
      prompt::answer_request(&state.question, &state.results, &state.history);
    let answer = self
      .generator
      .complete(&request)
      .await
      .map_err(|e| Error::model(ModelRole::Generator, e))?;

    state.history.push(Message::assistant(answer.clone()));
    Ok(answer)
  }
}
