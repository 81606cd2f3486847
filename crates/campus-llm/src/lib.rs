//! OpenAI-compatible chat-completion adapter for the campus assistant.
//!
//! [`ChatClient`] implements [`campus_core::ports::LanguageModel`]. The same
//! client type serves both the generator and the validator; only the
//! [`ChatConfig`] differs.

mod client;

pub mod config;
pub mod error;

pub use client::ChatClient;
pub use config::ChatConfig;
pub use error::{Error, Result};
