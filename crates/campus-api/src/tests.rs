//! Router tests against a scripted conversation service.

use std::{
  collections::HashMap,
  io,
  sync::{Arc, Mutex},
};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use campus_core::{
  Error, ModelRole, Result,
  engine::TurnOutcome,
  message::Message,
  ports::ProgressSink,
  progress::Progress,
  session::{Conversation, SessionKey},
  turn::{Grade, QueryResults},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

const QUERY: &str = "SELECT COUNT(*) AS n FROM students";

/// Answers every question in one happy attempt; `"offline"` fails upstream.
#[derive(Default)]
struct FakeConversation {
  histories: Mutex<HashMap<SessionKey, Vec<Message>>>,
}

impl Conversation for FakeConversation {
  async fn ask(
    &self,
    key: SessionKey,
    question: String,
    sink: &dyn ProgressSink,
  ) -> Result<TurnOutcome> {
    if question == "offline" {
      return Err(Error::Model {
        role:   ModelRole::Validator,
        source: Box::new(io::Error::other("connection refused")),
      });
    }

    sink.notify(Progress::Generating { attempt: 1, query: QUERY.into() });
    sink.notify(Progress::Executing { attempt: 1 });
    sink.notify(Progress::Validating { attempt: 1, grade: Grade::Happy, excerpt: None });

    let answer = "There are 3 students.".to_string();
    let mut histories = self.histories.lock().unwrap();
    let history = histories.entry(key).or_default();
    history.push(Message::user(question));
    history.push(Message::assistant(QUERY));
    history.push(Message::assistant(answer.clone()));

    Ok(TurnOutcome {
      answer,
      history: history.clone(),
      attempts: 1,
      grade: Grade::Happy,
      query: QUERY.into(),
      results: QueryResults::Rows(vec![]),
    })
  }

  async fn history(&self, key: &SessionKey) -> Vec<Message> {
    self.histories.lock().unwrap().get(key).cloned().unwrap_or_default()
  }

  async fn end_session(&self, key: &SessionKey) -> bool {
    self.histories.lock().unwrap().remove(key).is_some()
  }
}

fn app(service: &Arc<FakeConversation>) -> Router { api_router(service.clone()) }

async fn send(
  app: Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, String) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn parse(body: &str) -> Value { serde_json::from_str(body).unwrap() }

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_session_returns_fresh_key() {
  let service = Arc::new(FakeConversation::default());

  let (status, body) = send(app(&service), "POST", "/sessions", None).await;
  assert_eq!(status, StatusCode::CREATED);
  let first = parse(&body)["session_key"].as_str().unwrap().to_owned();

  let (_, body) = send(app(&service), "POST", "/sessions", None).await;
  let second = parse(&body)["session_key"].as_str().unwrap().to_owned();

  assert!(!first.is_empty());
  assert_ne!(first, second);
}

#[tokio::test]
async fn unseen_session_has_empty_history() {
  let service = Arc::new(FakeConversation::default());
  let (status, body) = send(app(&service), "GET", "/sessions/nobody/history", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn delete_session_forgets_history() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "How many students?" });
  send(app(&service), "POST", "/turns", Some(turn)).await;

  let (status, _) = send(app(&service), "DELETE", "/sessions/s1", None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, body) = send(app(&service), "GET", "/sessions/s1/history", None).await;
  assert_eq!(parse(&body), json!([]));

  // Idempotent.
  let (status, _) = send(app(&service), "DELETE", "/sessions/s1", None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

// ─── Turns ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn turn_returns_answer_and_progress() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "How many students?" });

  let (status, body) = send(app(&service), "POST", "/turns", Some(turn)).await;
  assert_eq!(status, StatusCode::OK);

  let reply = parse(&body);
  assert_eq!(reply["answer"], "There are 3 students.");
  assert_eq!(reply["attempts"], 1);
  assert_eq!(reply["grade"], "happy");
  assert_eq!(reply["query"], QUERY);

  let progress = reply["progress"].as_array().unwrap();
  assert_eq!(progress.len(), 3);
  assert_eq!(progress[0]["phase"], "generating");
  assert_eq!(progress[0]["message"], format!("**Drafting SQL:** `{QUERY}`"));
  assert_eq!(progress[1]["message"], "**Thinking**");
  assert_eq!(progress[2]["message"], "Preparing answer...");
}

#[tokio::test]
async fn turn_commits_history() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "How many students?" });
  send(app(&service), "POST", "/turns", Some(turn)).await;

  let (_, body) = send(app(&service), "GET", "/sessions/s1/history", None).await;
  assert_eq!(
    parse(&body),
    json!([
      { "role": "user", "content": "How many students?" },
      { "role": "assistant", "content": QUERY },
      { "role": "assistant", "content": "There are 3 students." },
    ])
  );
}

#[tokio::test]
async fn blank_question_is_bad_request() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "   " });

  let (status, body) = send(app(&service), "POST", "/turns", Some(turn)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(parse(&body)["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn blank_session_key_is_bad_request() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "", "question": "hi" });

  let (status, _) = send(app(&service), "POST", "/turns", Some(turn)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn model_failure_is_bad_gateway() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "offline" });

  let (status, body) = send(app(&service), "POST", "/turns", Some(turn)).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(parse(&body)["error"].as_str().unwrap().contains("connection refused"));
}

// ─── Streaming ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_sends_progress_then_answer() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "How many students?" });

  let (status, body) = send(app(&service), "POST", "/turns/stream", Some(turn)).await;
  assert_eq!(status, StatusCode::OK);

  assert_eq!(body.matches("event: progress").count(), 3);
  let answer_at = body.find("event: answer").unwrap();
  assert!(body.rfind("event: progress").unwrap() < answer_at);
  assert!(body[answer_at..].contains("There are 3 students."));
  assert!(body.contains("Drafting SQL"));
  assert!(!body.contains("event: error"));
}

#[tokio::test]
async fn stream_reports_failure_as_error_event() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "offline" });

  let (status, body) = send(app(&service), "POST", "/turns/stream", Some(turn)).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.contains("event: error"));
  assert!(body.contains("connection refused"));
  assert!(!body.contains("event: answer"));

  let (_, history) = send(app(&service), "GET", "/sessions/s1/history", None).await;
  assert_eq!(parse(&history), json!([]));
}

#[tokio::test]
async fn stream_rejects_blank_question_before_streaming() {
  let service = Arc::new(FakeConversation::default());
  let turn = json!({ "session_key": "s1", "question": "" });

  let (status, _) = send(app(&service), "POST", "/turns/stream", Some(turn)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
