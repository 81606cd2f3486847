//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sessions` | 201 with a fresh `session_key` |
//! | `GET`    | `/sessions/{key}/history` | Empty list for an unseen key |
//! | `DELETE` | `/sessions/{key}` | 204; call when the client disconnects |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  message::Message,
  session::{Conversation, SessionKey},
};
use serde::Serialize;

use crate::error::ApiError;

pub(crate) fn parse_key(raw: String) -> Result<SessionKey, ApiError> {
  if raw.trim().is_empty() {
    return Err(ApiError::BadRequest("session_key must not be blank".into()));
  }
  Ok(SessionKey::from(raw))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Created {
  pub session_key: SessionKey,
}

/// `POST /sessions`
///
/// Nothing is stored until the first turn commits.
pub async fn create() -> impl IntoResponse {
  let session_key = SessionKey::generate();
  (StatusCode::CREATED, Json(Created { session_key }))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /sessions/{key}/history`
pub async fn history<S: Conversation>(
  State(service): State<Arc<S>>,
  Path(key): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let key = parse_key(key)?;
  Ok(Json(service.history(&key).await))
}

// ─── End ──────────────────────────────────────────────────────────────────────

/// `DELETE /sessions/{key}`
pub async fn end<S: Conversation>(
  State(service): State<Arc<S>>,
  Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
  let key = parse_key(key)?;
  service.end_session(&key).await;
  Ok(StatusCode::NO_CONTENT)
}
