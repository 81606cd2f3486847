//! Error types for `campus-core`.

use std::fmt;

use thiserror::Error;

/// Which language-model port produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
  Generator,
  Validator,
}

impl fmt::Display for ModelRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Generator => f.write_str("generator"),
      Self::Validator => f.write_str("validator"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// A model port failed. Fatal to the turn; history is left untouched.
  #[error("{role} model failed: {source}")]
  Model {
    role:   ModelRole,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("question must not be empty")]
  EmptyQuestion,
}

impl Error {
  pub(crate) fn model<E>(role: ModelRole, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Model { role, source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
