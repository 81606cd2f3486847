//! [`ChatClient`]: `POST {base_url}/chat/completions`.

use std::time::Duration;

use reqwest::{
  Client,
  header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use campus_core::{message::Message, ports::LanguageModel};

use crate::{ChatConfig, Error, Result};

/// Longest slice of a non-JSON error body kept in [`Error::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Async client for one OpenAI-compatible model.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Requests
/// are never retried here.
#[derive(Debug, Clone)]
pub struct ChatClient {
  client: Client,
  config: ChatConfig,
}

impl ChatClient {
  pub fn new(config: ChatConfig) -> Result<Self> {
    if config.base_url.trim().is_empty() {
      return Err(Error::Config("base_url is empty".into()));
    }
    if config.model.trim().is_empty() {
      return Err(Error::Config("model is empty".into()));
    }

    let mut headers = HeaderMap::new();
    if !config.api_key.is_empty() {
      let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|_| Error::Config("api_key is not a valid header value".into()))?;
      headers.insert(AUTHORIZATION, auth);
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .default_headers(headers)
      .build()
      .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

    Ok(Self { client, config })
  }

  pub fn model(&self) -> &str { &self.config.model }

  fn completions_url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
  model:       &'a str,
  messages:    &'a [Message],
  temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
  message: String,
}

/// The provider's `{"error": {"message": ...}}`, or the start of the raw body.
fn error_message(body: &str) -> String {
  match serde_json::from_str::<ErrorEnvelope>(body) {
    Ok(envelope) => envelope.error.message,
    Err(_) => body.trim().chars().take(MAX_ERROR_BODY).collect(),
  }
}

// ─── Port ────────────────────────────────────────────────────────────────────

impl LanguageModel for ChatClient {
  type Error = Error;

  async fn complete(&self, messages: &[Message]) -> Result<String> {
    let request = CompletionRequest {
      model: &self.config.model,
      messages,
      temperature: self.config.temperature,
    };

    debug!(model = %self.config.model, messages = messages.len(), "chat completion");
    let resp = self
      .client
      .post(self.completions_url())
      .json(&request)
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
      let message = error_message(&body);
      warn!(model = %self.config.model, %status, %message, "chat completion rejected");
      return Err(Error::Status { status: status.as_u16(), message });
    }

    let parsed: CompletionResponse = serde_json::from_str(&body)
      .map_err(|e| Error::InvalidResponse(e.to_string()))?;
    let choice = parsed.choices.into_iter().next().ok_or(Error::EmptyChoices)?;
    choice
      .message
      .content
      .ok_or_else(|| Error::InvalidResponse("choice has no content".into()))
  }
}
