//! Handlers for `/turns` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/turns` | Body: `{"session_key":"…","question":"…"}`; returns the answer |
//! | `POST` | `/turns/stream` | Same body; SSE `progress` events, then `answer` or `error` |

use std::{
  convert::Infallible,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use axum::{
  Json,
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use campus_core::{
  engine::TurnOutcome,
  progress::Progress,
  session::{Conversation, SessionKey},
  turn::Grade,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use crate::{error::ApiError, sessions::parse_key};

// ─── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
  pub session_key: String,
  pub question:    String,
}

impl TurnRequest {
  fn validate(self) -> Result<(SessionKey, String), ApiError> {
    let key = parse_key(self.session_key)?;
    if self.question.trim().is_empty() {
      return Err(ApiError::BadRequest("question must not be blank".into()));
    }
    Ok((key, self.question))
  }
}

/// A progress notification with its rendered display text.
#[derive(Debug, Serialize)]
pub struct ProgressView {
  #[serde(flatten)]
  pub progress: Progress,
  pub message:  String,
}

impl From<Progress> for ProgressView {
  fn from(progress: Progress) -> Self {
    let message = progress.to_string();
    Self { progress, message }
  }
}

#[derive(Debug, Serialize)]
pub struct TurnReply {
  pub answer:   String,
  pub attempts: u32,
  pub grade:    Grade,
  pub query:    String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub progress: Vec<ProgressView>,
}

impl TurnReply {
  fn new(outcome: TurnOutcome, progress: Vec<Progress>) -> Self {
    Self {
      answer:   outcome.answer,
      attempts: outcome.attempts,
      grade:    outcome.grade,
      query:    outcome.query,
      progress: progress.into_iter().map(ProgressView::from).collect(),
    }
  }
}

// ─── Ask ──────────────────────────────────────────────────────────────────────

/// `POST /turns`
pub async fn ask<S: Conversation>(
  State(service): State<Arc<S>>,
  Json(body): Json<TurnRequest>,
) -> Result<Json<TurnReply>, ApiError> {
  let (key, question) = body.validate()?;

  let sink: Mutex<Vec<Progress>> = Mutex::new(Vec::new());
  let outcome = service.ask(key, question, &sink).await?;
  let progress = sink.into_inner().unwrap_or_else(PoisonError::into_inner);
  Ok(Json(TurnReply::new(outcome, progress)))
}

// ─── Stream ───────────────────────────────────────────────────────────────────

fn json_event(name: &str, payload: &impl Serialize) -> Event {
  Event::default()
    .event(name)
    .json_data(payload)
    .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

fn error_event(message: &str) -> Event {
  json_event("error", &serde_json::json!({ "error": message }))
}

/// `POST /turns/stream`
///
/// The turn runs in its own task. If the client goes away mid-turn the task
/// still finishes, so the session either commits the whole turn or nothing.
pub async fn stream<S: Conversation + 'static>(
  State(service): State<Arc<S>>,
  Json(body): Json<TurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
  let (key, question) = body.validate()?;

  let (progress_tx, progress_rx) = mpsc::unbounded_channel::<Progress>();
  let (done_tx, done_rx) = oneshot::channel();

  tokio::spawn(async move {
    let result = service.ask(key, question, &progress_tx).await;
    drop(progress_tx);
    let _ = done_tx.send(result);
  });

  let progress = UnboundedReceiverStream::new(progress_rx)
    .map(|p| json_event("progress", &ProgressView::from(p)));

  let finish = stream::once(async move {
    match done_rx.await {
      Ok(Ok(outcome)) => json_event("answer", &TurnReply::new(outcome, Vec::new())),
      Ok(Err(e)) => {
        warn!(error = %e, "streamed turn failed");
        error_event(&ApiError::from(e).to_string())
      }
      Err(_) => error_event("turn aborted"),
    }
  });

  let events = progress.chain(finish).map(Ok);
  Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
