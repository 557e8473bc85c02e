//! Locate and parse the JSON object inside raw model text.
//!
//! Models inconsistently wrap structured output in Markdown fences and
//! sometimes surround it with commentary. Strategies, tried in order:
//! 1. the interior of a fenced block tagged `json`;
//! 2. the whole trimmed text;
//! 3. the first balanced `{...}` span that parses, scanning string literals
//!    so braces inside strings are not counted.
//!
//! Only JSON objects are accepted.

use serde_json::Value;

use crate::error::GenerationError;

const FENCE: &str = "```";

/// Extract the JSON object carried by `raw`.
pub fn extract_json(raw: &str) -> Result<Value, GenerationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(GenerationError::ResponseFormat("model reply is empty".to_string()));
    }

    if let Some(value) = fenced_json_block(text).and_then(parse_object) {
        return Ok(value);
    }

    if let Some(value) = parse_object(text) {
        return Ok(value);
    }

    first_parseable_span(text).ok_or_else(|| {
        GenerationError::ResponseFormat("no JSON object found in model reply".to_string())
    })
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Return the interior of the first fenced block whose info string is
/// `json` (case-insensitive).
fn fenced_json_block(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(start) = rest.find(FENCE) {
        let after_fence = &rest[start + FENCE.len()..];
        let line_end = after_fence.find('\n')?;
        let info = after_fence[..line_end].trim();
        let body = &after_fence[line_end + 1..];
        let close = body.find(FENCE)?;

        if info.eq_ignore_ascii_case("json") {
            return Some(&body[..close]);
        }
        rest = &body[close + FENCE.len()..];
    }
    None
}

/// Parse the first balanced `{...}` span that holds a JSON object.
///
/// Each `{` is tried as a start position in turn, so a stray unbalanced
/// brace in leading commentary does not hide a later object.
fn first_parseable_span(text: &str) -> Option<Value> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_span(&text[start..]))
        .find_map(parse_object)
}

/// Return the prefix of `text` (which starts with `{`) up to its matching
/// `}`, ignoring braces inside JSON string literals.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
