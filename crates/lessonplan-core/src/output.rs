//! Output shape validation and the content/error mutual-exclusion invariant.
//!
//! The model is an untrusted collaborator: its reply is checked key by key
//! and normalized into a [`GeneratedContent`] whose state is always one of
//! - `mensagem_erro` null and all four content fields populated, or
//! - `mensagem_erro` set and all four content fields null.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GenerationError;

/// Content keys in output order.
pub const CONTENT_KEYS: [&str; 4] = [
    "intro_ludica",
    "objetivo_bncc",
    "steps",
    "evaluation_rubric",
];

/// Error key.
pub const ERROR_KEY: &str = "mensagem_erro";

/// Lesson-plan content, or a reason it could not be produced.
///
/// Serializes to the five-key wire shape used by every response of the
/// generation endpoint. Fields are private so the mutual-exclusion
/// invariant cannot be broken by callers; build values with
/// [`GeneratedContent::success`] or [`GeneratedContent::failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
    intro_ludica: Option<String>,
    objetivo_bncc: Option<String>,
    steps: Option<String>,
    evaluation_rubric: Option<String>,
    mensagem_erro: Option<String>,
}

impl GeneratedContent {
    /// Populated content with no error.
    pub fn success(
        intro_ludica: impl Into<String>,
        objetivo_bncc: impl Into<String>,
        steps: impl Into<String>,
        evaluation_rubric: impl Into<String>,
    ) -> Self {
        Self {
            intro_ludica: Some(intro_ludica.into()),
            objetivo_bncc: Some(objetivo_bncc.into()),
            steps: Some(steps.into()),
            evaluation_rubric: Some(evaluation_rubric.into()),
            mensagem_erro: None,
        }
    }

    /// Error message with every content field nulled.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            intro_ludica: None,
            objetivo_bncc: None,
            steps: None,
            evaluation_rubric: None,
            mensagem_erro: Some(message.into()),
        }
    }

    pub fn intro_ludica(&self) -> Option<&str> {
        self.intro_ludica.as_deref()
    }

    pub fn objetivo_bncc(&self) -> Option<&str> {
        self.objetivo_bncc.as_deref()
    }

    pub fn steps(&self) -> Option<&str> {
        self.steps.as_deref()
    }

    pub fn evaluation_rubric(&self) -> Option<&str> {
        self.evaluation_rubric.as_deref()
    }

    pub fn mensagem_erro(&self) -> Option<&str> {
        self.mensagem_erro.as_deref()
    }

    pub fn is_failure(&self) -> bool {
        self.mensagem_erro.is_some()
    }

    /// Turn a failure-shaped value into a [`GenerationError::Domain`].
    pub fn into_result(self) -> Result<Self, GenerationError> {
        match self.mensagem_erro {
            Some(message) => Err(GenerationError::Domain(message)),
            None => Ok(self),
        }
    }
}

/// Validate a parsed model reply and enforce the mutual-exclusion invariant.
///
/// Each of the five keys, when present, must be a string or null. A
/// non-blank `mensagem_erro` wins: the result is a failure value whatever
/// the content keys held. Otherwise all four content keys must be present,
/// non-blank strings. An absent `mensagem_erro` is read as null.
pub fn validate_output(value: &Value) -> Result<GeneratedContent, GenerationError> {
    let object = value.as_object().ok_or_else(|| {
        GenerationError::ResponseFormat("model reply is not a JSON object".to_string())
    })?;

    let mut content: [Option<String>; 4] = Default::default();
    for (slot, key) in content.iter_mut().zip(CONTENT_KEYS) {
        *slot = nullable_string(object, key)?;
    }
    let error = nullable_string(object, ERROR_KEY)?;

    if let Some(message) = error.filter(|m| !m.trim().is_empty()) {
        return Ok(GeneratedContent::failure(message));
    }

    let mut missing = Vec::new();
    for (slot, key) in content.iter().zip(CONTENT_KEYS) {
        if slot.as_deref().is_none_or(|s| s.trim().is_empty()) {
            missing.push(key);
        }
    }
    if !missing.is_empty() {
        return Err(GenerationError::ResponseFormat(format!(
            "content fields missing or empty without an error message: {}",
            missing.join(", ")
        )));
    }

    let [intro_ludica, objetivo_bncc, steps, evaluation_rubric] =
        content.map(Option::unwrap_or_default);
    Ok(GeneratedContent::success(
        intro_ludica,
        objetivo_bncc,
        steps,
        evaluation_rubric,
    ))
}

fn nullable_string(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, GenerationError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(GenerationError::ResponseFormat(format!(
            "key {key:?} must be a string or null, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_reply() -> Value {
        json!({
            "intro_ludica": "Vamos viajar no tempo!",
            "objetivo_bncc": "EF08GE01",
            "steps": "- Passo 1: ...",
            "evaluation_rubric": "Critério 1: ...",
            "mensagem_erro": null
        })
    }

    #[test]
    fn accepts_populated_reply() {
        let content = validate_output(&full_reply()).unwrap();
        assert!(!content.is_failure());
        assert_eq!(content.intro_ludica(), Some("Vamos viajar no tempo!"));
        assert_eq!(content.evaluation_rubric(), Some("Critério 1: ..."));
    }

    #[test]
    fn error_message_forces_content_to_null() {
        let mut reply = full_reply();
        reply["mensagem_erro"] = json!("duration too short for requested activity");
        let content = validate_output(&reply).unwrap();
        assert_eq!(content, GeneratedContent::failure("duration too short for requested activity"));
        assert_eq!(content.intro_ludica(), None);
        assert_eq!(content.objetivo_bncc(), None);
        assert_eq!(content.steps(), None);
        assert_eq!(content.evaluation_rubric(), None);
    }

    #[test]
    fn error_only_reply_is_accepted() {
        let content = validate_output(&json!({ "mensagem_erro": "faixa etária inválida" })).unwrap();
        assert_eq!(content.mensagem_erro(), Some("faixa etária inválida"));
    }

    #[test]
    fn error_message_is_returned_verbatim() {
        let mut reply = full_reply();
        reply["mensagem_erro"] = json!("  duração curta demais\n");
        let content = validate_output(&reply).unwrap();
        assert_eq!(content.mensagem_erro(), Some("  duração curta demais\n"));
        assert_eq!(content.steps(), None);
    }

    #[test]
    fn blank_error_is_treated_as_null() {
        let mut reply = full_reply();
        reply["mensagem_erro"] = json!("  ");
        assert!(!validate_output(&reply).unwrap().is_failure());
    }

    #[test]
    fn missing_error_key_is_treated_as_null() {
        let mut reply = full_reply();
        reply.as_object_mut().unwrap().remove("mensagem_erro");
        assert!(!validate_output(&reply).unwrap().is_failure());
    }

    #[test]
    fn rejects_missing_content_without_error() {
        let mut reply = full_reply();
        reply.as_object_mut().unwrap().remove("steps");
        reply["objetivo_bncc"] = json!("");
        let err = validate_output(&reply).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, GenerationError::ResponseFormat(_)));
        assert!(msg.contains("objetivo_bncc") && msg.contains("steps"), "{msg}");
    }

    #[test]
    fn rejects_wrongly_typed_keys() {
        let mut reply = full_reply();
        reply["steps"] = json!(["a", "b"]);
        let err = validate_output(&reply).unwrap_err();
        assert!(err.to_string().contains("array"), "{err}");

        let mut reply = full_reply();
        reply["mensagem_erro"] = json!(false);
        assert!(validate_output(&reply).is_err());
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(
            validate_output(&json!("texto")).unwrap_err(),
            GenerationError::ResponseFormat(_)
        ));
    }

    #[test]
    fn into_result_classifies_failures_as_domain_errors() {
        let err = GeneratedContent::failure("x").into_result().unwrap_err();
        assert!(matches!(err, GenerationError::Domain(ref m) if m == "x"));
        assert!(GeneratedContent::success("a", "b", "c", "d").into_result().is_ok());
    }

    #[test]
    fn serializes_to_five_key_shape() {
        let value = serde_json::to_value(GeneratedContent::failure("x")).unwrap();
        assert_eq!(
            value,
            json!({
                "intro_ludica": null,
                "objetivo_bncc": null,
                "steps": null,
                "evaluation_rubric": null,
                "mensagem_erro": "x"
            })
        );
    }
}
