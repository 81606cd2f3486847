//! Error type for `campus-llm`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid client configuration: {0}")]
  Config(String),

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("invalid response: {0}")]
  InvalidResponse(String),

  #[error("response contained no choices")]
  EmptyChoices,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
