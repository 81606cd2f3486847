//! Error type for `campus-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database file not found: {0}")]
  MissingDatabase(PathBuf),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

impl Error {
  /// The message handed to the models as `{"error": ...}`.
  ///
  /// Unwraps the underlying SQLite message so the validator sees e.g.
  /// `no such table: teacher` rather than the wrapper's formatting.
  pub fn describe(&self) -> String {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => e.to_string(),
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
