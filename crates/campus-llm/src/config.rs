//! Connection settings for one chat-completion endpoint.

use std::fmt;

use serde::Deserialize;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Endpoint, model and sampling settings.
///
/// An empty `api_key` sends no `Authorization` header, which suits local
/// OpenAI-compatible servers.
#[derive(Clone, Deserialize)]
pub struct ChatConfig {
  pub base_url:     String,
  pub model:        String,
  #[serde(default)]
  pub api_key:      String,
  #[serde(default)]
  pub temperature:  f32,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 120 }

impl ChatConfig {
  pub fn new(
    base_url: impl Into<String>,
    model: impl Into<String>,
    api_key: impl Into<String>,
  ) -> Self {
    Self {
      base_url:     base_url.into(),
      model:        model.into(),
      api_key:      api_key.into(),
      temperature:  0.0,
      timeout_secs: default_timeout_secs(),
    }
  }

  /// OpenAI's hosted `gpt-4o-mini`.
  pub fn openai(api_key: impl Into<String>) -> Self {
    Self::new(OPENAI_BASE_URL, OPENAI_MODEL, api_key)
  }

  /// Groq's hosted `llama-3.3-70b-versatile`.
  pub fn groq(api_key: impl Into<String>) -> Self {
    Self::new(GROQ_BASE_URL, GROQ_MODEL, api_key)
  }
}

impl fmt::Debug for ChatConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChatConfig")
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
      .field("temperature", &self.temperature)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}
