//! Core types, ports, and the self-correcting query loop for the campus
//! question-answering assistant.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! language models, the SQL executor, and the session store are all reached
//! through the traits in [`ports`]; concrete adapters live in sibling crates.

pub mod engine;
pub mod error;
pub mod message;
pub mod ports;
pub mod progress;
pub mod prompt;
pub mod session;
pub mod sql;
pub mod turn;

pub use error::{Error, ModelRole, Result};
