//! Request builders for the generator and validator.
//!
//! The instruction text describes the fixed university schema. Builders only
//! assemble messages; they never call a model.

use crate::{
  message::Message,
  turn::QueryResults,
};

// ─── Fixed instructions ──────────────────────────────────────────────────────

/// Schema description, join rules, and operational constraints for SQL
/// generation.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are an SQL assistant for a university records system.
Translate each user question into a single SQLite query.

### SCHEMA ###
1. universities (id, name)
2. students (id, univ_id, first_name, last_name)
3. teachers (id, univ_id, first_name, last_name, department)
4. courses (id, univ_id, name)
5. course_assignments (course_id, teacher_id) -- many-to-many
6. enrollments (student_id, course_id, grade)

### JOIN RULES ###
1. University names live only in `universities`. Filter by joining it, e.g.
   JOIN universities u ON s.univ_id = u.id.
2. What a student takes: students s -> enrollments e -> courses c.
3. Which students take a course: join students and enrollments; only list
   students with an enrollment row for that course.
4. Match university names with LIKE '%<name>%'.

### OPERATIONAL RULES ###
- Only SELECT statements. Never INSERT, UPDATE, DELETE, ALTER, or DROP.
- Return only the SQL text: no Markdown fences, no explanation.
- For small talk or personal questions (e.g. \"What is my name?\") return NO_QUERY.
- When a course name exists at several universities, use the university from
  the conversation.

### FOLLOW-UPS ###
- Existing Data below is what the database has returned so far this turn.
- If it lacks what the question needs, write a new query.
- Never invent names, courses, or counts.";

/// Appended to the system message on every generation request.
pub const TURN_INSTRUCTION: &str = "\n\n[INSTRUCTION]: Use the history only to resolve references such as 'they'. \
Do not answer from memory. If the question needs information that is not in \
Existing Data, you must write an SQL query.";

/// Template for the validator; `{question}`, `{sql}` and `{results}` are
/// substituted.
pub const VALIDATOR_TEMPLATE: &str = "\
You are a data auditor. Decide whether the SQL results answer the user question.

User Question: {question}
SQL Generated: {sql}
SQL Results: {results}

### TASKS ###
1. If the results contain an 'error' key, respond 'INVALID:' followed by the error.
2. If the results are empty but the question implies data should exist, respond
   'INVALID: No data found, check if the University/Course names are exact.'
3. If the data belongs to the wrong university, respond 'INVALID: Wrong university context.'
4. If everything is correct and specific to the question, respond only with 'VALID'.

Briefly explain any problems.";

const ANSWER_INSTRUCTION: &str = "\
INSTRUCTION: Answer the question. If the answer is already in the conversation \
history (for example the user's name), use it. Otherwise use the database \
results. If nothing relevant was found, say so plainly. Be natural.";

// ─── Builders ────────────────────────────────────────────────────────────────

/// `[system, ...history, user(question)]` for a generation attempt.
pub fn generation_request(
  results: &QueryResults,
  history: &[Message],
  question: &str,
) -> Vec<Message> {
  let system = format!(
    "{SYSTEM_INSTRUCTIONS}{TURN_INSTRUCTION}\nExisting Data: {}",
    results.to_json()
  );

  let mut messages = Vec::with_capacity(history.len() + 2);
  messages.push(Message::system(system));
  messages.extend(history.iter().cloned());
  messages.push(Message::user(question));
  messages
}

/// A single user message carrying the filled-in validator template.
pub fn validation_request(
  question: &str,
  sql: &str,
  results: &QueryResults,
) -> Vec<Message> {
  let results = results.to_json().to_string();
  let body = fill_template(VALIDATOR_TEMPLATE, &[
    ("question", question),
    ("sql", sql),
    ("results", results.as_str()),
  ]);
  vec![Message::user(body)]
}

/// A single user message asking for the final natural-language answer.
pub fn answer_request(
  question: &str,
  results: &QueryResults,
  history: &[Message],
) -> Vec<Message> {
  let body = format!(
    "User Question: {question}\n\
     Database Results: {}\n\
     Conversation History:\n{}\n\n\
     {ANSWER_INSTRUCTION}",
    results.to_json(),
    render_history(history),
  );
  vec![Message::user(body)]
}

/// Substitute `{name}` placeholders in a single pass over `template`.
/// Substituted values are never rescanned, and unknown braces pass through.
fn fill_template(template: &str, fields: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let tail = &rest[open + 1..];
    let hit = fields.iter().find(|(name, _)| {
      tail.strip_prefix(*name).is_some_and(|t| t.starts_with('}'))
    });
    match hit {
      Some((name, value)) => {
        out.push_str(value);
        rest = &tail[name.len() + 1..];
      }
      None => {
        out.push('{');
        rest = tail;
      }
    }
  }
  out.push_str(rest);
  out
}

fn render_history(history: &[Message]) -> String {
  history
    .iter()
    .map(|m| format!("{}: {}", m.role, m.content))
    .collect::<Vec<_>>()
    .join("\n")
}
