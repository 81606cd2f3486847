//! Read-only SQLite query executor for the campus assistant.
//!
//! Wraps [`tokio_rusqlite`] so statements run on a dedicated thread without
//! blocking the async runtime. Every call opens its own read-only connection,
//! runs one statement, and closes it again.

mod encode;
mod executor;

pub mod error;

pub use error::{Error, Result};
pub use executor::ReadOnlyExecutor;

#[cfg(test)]
mod tests;
