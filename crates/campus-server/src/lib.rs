//! Wiring for the campus assistant server: configuration, the concrete
//! assistant type, and the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use campus_core::{
  engine::QueryLoop,
  session::{Assistant, Conversation, InMemorySessions},
};
use campus_llm::{
  ChatClient, ChatConfig,
  config::{GROQ_BASE_URL, GROQ_MODEL, OPENAI_BASE_URL, OPENAI_MODEL},
};
use campus_store_sqlite::ReadOnlyExecutor;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAMPUS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  pub generator:     ChatConfig,
  pub validator:     ChatConfig,
}

/// `CAMPUS_PORT=8080`, `CAMPUS_GENERATOR__MODEL=gpt-4o`, ...
pub fn environment() -> Environment {
  Environment::with_prefix("CAMPUS")
    .prefix_separator("_")
    .separator("__")
}

/// Load configuration from `path` (optional) and the process environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
  load_config_with(path, environment())
}

/// Layering, lowest first: built-in defaults, the TOML file, then `env`.
pub fn load_config_with(
  path: &Path,
  env: Environment,
) -> Result<ServerConfig, ConfigError> {
  Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 7860)?
    .set_default("database_path", "data/university.db")?
    .set_default("generator.base_url", OPENAI_BASE_URL)?
    .set_default("generator.model", OPENAI_MODEL)?
    .set_default("validator.base_url", GROQ_BASE_URL)?
    .set_default("validator.model", GROQ_MODEL)?
    .add_source(File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("store: {0}")]
  Store(#[from] campus_store_sqlite::Error),

  #[error("model client: {0}")]
  Model(#[from] campus_llm::Error),
}

/// The assistant as deployed: two chat clients over a read-only database.
pub type CampusAssistant = Assistant<ChatClient, ChatClient, ReadOnlyExecutor>;

/// Build the assistant. Fails fast if the database file does not exist.
pub fn build_assistant(config: &ServerConfig) -> Result<CampusAssistant, Error> {
  let executor = ReadOnlyExecutor::open(&config.database_path)?;
  let generator = ChatClient::new(config.generator.clone())?;
  let validator = ChatClient::new(config.validator.clone())?;

  info!(
    database = %config.database_path.display(),
    generator = generator.model(),
    validator = validator.model(),
    "assistant ready"
  );
  let engine = QueryLoop::new(generator, validator, executor);
  Ok(Assistant::new(engine, InMemorySessions::new()))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API under `/api`, plus `GET /health`, with request tracing.
pub fn router<S>(service: Arc<S>) -> Router
where
  S: Conversation + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", campus_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }
