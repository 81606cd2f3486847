//! Phase notifications emitted while a turn runs.
//!
//! The loop reports to a [`ProgressSink`](crate::ports::ProgressSink) at every
//! phase boundary. Notifications never influence control flow.

use std::fmt;

use serde::Serialize;

use crate::turn::Grade;

/// Verdict excerpts are cut to this many characters.
pub const EXCERPT_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Progress {
  /// A candidate query was drafted.
  Generating { attempt: u32, query: String },
  /// The candidate is being run (or skipped in chat-mode).
  Executing { attempt: u32 },
  /// The verdict is in. `excerpt` is set only when it was rejected.
  Validating {
    attempt: u32,
    grade:   Grade,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
  },
}

impl Progress {
  pub(crate) fn validating(attempt: u32, grade: Grade, verdict: &str) -> Self {
    let excerpt = match grade {
      Grade::Happy => None,
      Grade::TryAgain | Grade::GiveUp => Some(excerpt(verdict)),
    };
    Self::Validating { attempt, grade, excerpt }
  }

  pub fn attempt(&self) -> u32 {
    match self {
      Self::Generating { attempt, .. }
      | Self::Executing { attempt }
      | Self::Validating { attempt, .. } => *attempt,
    }
  }
}

impl fmt::Display for Progress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Generating { query, .. } => write!(f, "**Drafting SQL:** `{query}`"),
      Self::Executing { .. } => f.write_str("**Thinking**"),
      Self::Validating { grade: Grade::Happy, .. } => {
        f.write_str("Preparing answer...")
      }
      Self::Validating { grade: Grade::TryAgain, excerpt, .. } => write!(
        f,
        "**Validation failed.** Retrying... (Error: {}...)",
        excerpt.as_deref().unwrap_or_default()
      ),
      Self::Validating { grade: Grade::GiveUp, excerpt, .. } => write!(
        f,
        "**Validation failed.** Giving up and answering with what was found. (Error: {}...)",
        excerpt.as_deref().unwrap_or_default()
      ),
    }
  }
}

/// The first [`EXCERPT_CHARS`] characters of a verdict.
pub fn excerpt(verdict: &str) -> String {
  verdict.chars().take(EXCERPT_CHARS).collect()
}
