//! Integration tests for `ReadOnlyExecutor` against a seeded database file.

use campus_core::{ports::QueryExecutor, turn::QueryResults};
use serde_json::json;
use tempfile::TempDir;

use crate::{Error, ReadOnlyExecutor};

const SEED: &str = "
  CREATE TABLE universities (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
  CREATE TABLE teachers (
    id INTEGER PRIMARY KEY, univ_id INTEGER, first_name TEXT,
    last_name TEXT, department TEXT
  );
  CREATE TABLE enrollments (student_id INTEGER, course_id INTEGER, grade REAL);
  CREATE TABLE blobs (data BLOB);

  INSERT INTO universities VALUES (1, 'MIT'), (2, 'Stanford University');
  INSERT INTO teachers VALUES
    (1, 1, 'Ana', 'Lee', 'Physics'),
    (2, 1, 'Raj', 'Patel', NULL),
    (3, 2, 'Mia', 'Chen', 'History');
  INSERT INTO enrollments VALUES (1, 1, 91.5);
  INSERT INTO blobs VALUES (x'cafe');
";

/// A seeded database in a temp dir. Keep the `TempDir` alive for the test.
fn fixture() -> (TempDir, ReadOnlyExecutor) {
  let dir = TempDir::new().expect("temp dir");
  let path = dir.path().join("university.db");
  let conn = rusqlite::Connection::open(&path).expect("create db");
  conn.execute_batch(SEED).expect("seed db");
  drop(conn);

  let executor = ReadOnlyExecutor::open(&path).expect("open executor");
  (dir, executor)
}

fn error_of(results: &QueryResults) -> &str {
  match results {
    QueryResults::Failed { error } => error,
    other => panic!("expected an error row, got {other:?}"),
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_returns_rows_keyed_by_column() {
  let (_dir, exec) = fixture();

  let results = exec
    .execute(
      "SELECT t.first_name, t.last_name FROM teachers t \
       JOIN universities u ON t.univ_id = u.id \
       WHERE u.name LIKE '%MIT%' ORDER BY t.id",
    )
    .await;

  assert_eq!(
    results.to_json(),
    json!([
      { "first_name": "Ana", "last_name": "Lee" },
      { "first_name": "Raj", "last_name": "Patel" },
    ])
  );
}

#[tokio::test]
async fn empty_result_is_empty_rows() {
  let (_dir, exec) = fixture();
  let results = exec
    .execute("SELECT * FROM universities WHERE name = 'Harvard'")
    .await;
  assert_eq!(results, QueryResults::Rows(vec![]));
}

#[tokio::test]
async fn column_order_and_aliases_are_preserved() {
  let (_dir, exec) = fixture();
  let results = exec
    .execute("SELECT name AS university, id FROM universities WHERE id = 2")
    .await;

  let QueryResults::Rows(rows) = results else { panic!("expected rows") };
  let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
  assert_eq!(keys, ["university", "id"]);
  assert_eq!(rows[0]["university"], json!("Stanford University"));
}

#[tokio::test]
async fn values_map_to_json_types() {
  let (_dir, exec) = fixture();

  let results = exec
    .execute("SELECT department FROM teachers WHERE id = 2")
    .await;
  assert_eq!(results.to_json(), json!([{ "department": null }]));

  let results = exec.execute("SELECT grade FROM enrollments").await;
  assert_eq!(results.to_json(), json!([{ "grade": 91.5 }]));

  let results = exec.execute("SELECT COUNT(*) AS n FROM teachers").await;
  assert_eq!(results.to_json(), json!([{ "n": 3 }]));

  let results = exec.execute("SELECT data FROM blobs").await;
  assert_eq!(results.to_json(), json!([{ "data": "cafe" }]));
}

// ─── Failures become error rows ──────────────────────────────────────────────

#[tokio::test]
async fn malformed_sql_is_an_error_row() {
  let (_dir, exec) = fixture();
  let results = exec.execute("SELEC name FROM universities").await;
  assert!(error_of(&results).contains("syntax error"));
}

#[tokio::test]
async fn unknown_table_is_an_error_row() {
  let (_dir, exec) = fixture();
  let results = exec.execute("SELECT * FROM teacher").await;
  assert!(error_of(&results).contains("no such table: teacher"));
}

#[tokio::test]
async fn writes_are_rejected() {
  let (_dir, exec) = fixture();

  for sql in [
    "INSERT INTO universities VALUES (3, 'Caltech')",
    "UPDATE teachers SET department = 'Math'",
    "DELETE FROM teachers",
    "DROP TABLE teachers",
    "CREATE TABLE hacked (id INTEGER)",
  ] {
    let results = exec.execute(sql).await;
    assert!(
      error_of(&results).contains("readonly"),
      "{sql} was not rejected: {results:?}"
    );
  }

  let results = exec.execute("SELECT COUNT(*) AS n FROM teachers").await;
  assert_eq!(results.to_json(), json!([{ "n": 3 }]));
}

#[tokio::test]
async fn database_removed_after_open_is_an_error_row() {
  let (dir, exec) = fixture();
  std::fs::remove_file(dir.path().join("university.db")).expect("remove db");

  let results = exec.execute("SELECT 1").await;
  assert!(!error_of(&results).is_empty());
}

// ─── Opening ─────────────────────────────────────────────────────────────────

#[test]
fn open_rejects_missing_file() {
  let dir = TempDir::new().expect("temp dir");
  let missing = dir.path().join("nope.db");

  let err = ReadOnlyExecutor::open(&missing).unwrap_err();
  assert!(matches!(err, Error::MissingDatabase(p) if p == missing));
}
