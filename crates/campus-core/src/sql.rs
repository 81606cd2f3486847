//! Helpers for the raw text the generator returns.

/// Sentinel meaning "no database access needed for this turn".
pub const NO_QUERY: &str = "NO_QUERY";

const FENCE: &str = "```";

/// Remove Markdown code fences (```` ``` ```` and ```` ```sql ````) and trim.
pub fn strip_code_fences(raw: &str) -> String {
  let mut out  = String::with_capacity(raw.len());
  let mut rest = raw;

  while let Some(idx) = rest.find(FENCE) {
    out.push_str(&rest[..idx]);
    rest = &rest[idx + FENCE.len()..];
    if rest.get(..3).is_some_and(|tag| tag.eq_ignore_ascii_case("sql")) {
      rest = &rest[3..];
    }
  }
  out.push_str(rest);

  out.trim().to_owned()
}

/// Whether the candidate asks to skip the database. Case-insensitive
/// substring match, so `"no_query"` and `"NO_QUERY."` both count.
pub fn is_no_query(candidate: &str) -> bool {
  candidate.to_ascii_uppercase().contains(NO_QUERY)
}
