//! [`ReadOnlyExecutor`]: the SQLite implementation of [`QueryExecutor`].

use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use tracing::{debug, warn};

use campus_core::{
  ports::QueryExecutor,
  turn::{QueryResults, Row},
};

use crate::{Error, Result, encode::encode_value};

// ─── Executor ────────────────────────────────────────────────────────────────

/// Runs generated statements against a SQLite file that it can never modify.
///
/// The file is opened with `SQLITE_OPEN_READ_ONLY` and the connection is
/// additionally put in `query_only` mode, so writes fail at the engine level
/// whatever the statement text says. Each call gets its own connection.
#[derive(Debug, Clone)]
pub struct ReadOnlyExecutor {
  path: PathBuf,
}

impl ReadOnlyExecutor {
  /// Bind to an existing database file. Nothing is opened until the first
  /// query.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.is_file() {
      return Err(Error::MissingDatabase(path.to_path_buf()));
    }
    Ok(Self { path: path.to_path_buf() })
  }

  pub fn path(&self) -> &Path { &self.path }

  fn flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_ONLY
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX
  }

  async fn query(&self, sql: String) -> Result<Vec<Row>> {
    let conn =
      tokio_rusqlite::Connection::open_with_flags(&self.path, Self::flags())
        .await?;

    let rows = conn
      .call(move |conn| {
        conn.pragma_update(None, "query_only", true)?;

        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
          let mut record = Row::new();
          for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), encode_value(row.get_ref(i)?));
          }
          out.push(record);
        }
        Ok(out)
      })
      .await;

    if let Err(e) = conn.close().await {
      warn!(error = %e, "failed to close read-only connection");
    }
    Ok(rows?)
  }
}

impl QueryExecutor for ReadOnlyExecutor {
  async fn execute(&self, sql: &str) -> QueryResults {
    match self.query(sql.to_owned()).await {
      Ok(rows) => {
        debug!(rows = rows.len(), "statement returned");
        QueryResults::Rows(rows)
      }
      Err(e) => {
        let error = e.describe();
        warn!(%error, "statement failed");
        QueryResults::failed(error)
      }
    }
  }
}
