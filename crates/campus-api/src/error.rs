//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("upstream failure: {0}")]
  Upstream(String),
}

impl From<campus_core::Error> for ApiError {
  fn from(e: campus_core::Error) -> Self {
    match e {
      campus_core::Error::EmptyQuestion => ApiError::BadRequest(e.to_string()),
      campus_core::Error::Model { .. } => ApiError::Upstream(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
