//! SQLite value → JSON conversion for result rows.

use rusqlite::types::ValueRef;
use serde_json::{Number, Value};

/// INTEGER and REAL become numbers, TEXT a string, BLOB a lowercase hex
/// string, NULL null. Non-finite reals have no JSON form and become null.
pub(crate) fn encode_value(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::from(i),
    ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
    ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::String(hex::encode(b)),
  }
}
