//! JSON and SSE HTTP API for the campus assistant.
//!
//! Exposes an axum [`Router`] backed by any
//! [`campus_core::session::Conversation`]. Transport concerns such as
//! tracing layers and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(assistant.clone()))
//! ```

pub mod error;
pub mod sessions;
pub mod turns;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use campus_core::session::Conversation;

pub use error::ApiError;

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<S>) -> Router<()>
where
  S: Conversation + 'static,
{
  Router::new()
    // Sessions
    .route("/sessions", post(sessions::create))
    .route("/sessions/{key}", delete(sessions::end::<S>))
    .route("/sessions/{key}/history", get(sessions::history::<S>))
    // Turns
    .route("/turns", post(turns::ask::<S>))
    .route("/turns/stream", post(turns::stream::<S>))
    .with_state(service)
}

#[cfg(test)]
mod tests;
