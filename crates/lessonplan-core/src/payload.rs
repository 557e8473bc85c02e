//! Inbound payload validation.
//!
//! Turns an untyped request body into a [`RequestPayload`] and reports every
//! violated field at once, so a caller can fix all problems in one round
//! trip. Checks, in order:
//! - the body parses as JSON and is an object;
//! - every required field is present;
//! - text fields are strings, non-empty after trimming;
//! - `duration_minutes` is an integer greater than zero;
//! - `user_id` is a UUID (persistence path only).

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FieldViolation, GenerationError};

/// Text fields shared by every lesson-plan payload, in prompt order.
pub const TEXT_FIELDS: [&str; 6] = [
    "main_theme",
    "secondary_theme",
    "objective",
    "subject",
    "age_group",
    "resources",
];

/// Optional content fields accepted on the persistence path.
const CONTENT_FIELDS: [&str; 3] = ["introduction", "steps", "evaluation_rubric"];

/// Validated generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    pub main_theme: String,
    pub secondary_theme: String,
    pub objective: String,
    pub subject: String,
    pub age_group: String,
    pub resources: String,
    pub duration_minutes: u32,
    /// Present only when validated for the persistence path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Validated payload for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLessonPlanRequest {
    pub payload: RequestPayload,
    pub user_id: Uuid,
    pub introduction: Option<String>,
    pub steps: Option<String>,
    pub evaluation_rubric: Option<String>,
}

/// Which call site the payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Content generation; `user_id` is ignored.
    Generation,
    /// Storing a lesson plan; `user_id` is required and must be a UUID.
    Persistence,
}

/// Validate a raw body for the generation endpoint.
pub fn validate_generation_payload(body: &[u8]) -> Result<RequestPayload, GenerationError> {
    let value = parse_body(body)?;
    validate(&value, ValidationMode::Generation)
}

/// Validate a raw body for the persistence path.
///
/// On top of the generation checks, requires a UUID `user_id` and accepts
/// optional string `introduction`, `steps` and `evaluation_rubric` fields.
pub fn validate_persistence_payload(body: &[u8]) -> Result<SaveLessonPlanRequest, GenerationError> {
    let value = parse_body(body)?;

    // Collect content-field problems alongside the core ones so the caller
    // still sees every violation in one response.
    let mut content = [None, None, None];
    let mut extra = Vec::new();
    if let Some(object) = value.as_object() {
        for (slot, field) in content.iter_mut().zip(CONTENT_FIELDS) {
            match object.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => *slot = Some(s.trim().to_string()),
                Some(_) => extra.push(FieldViolation::new(field, "must be a string")),
            }
        }
    }

    let payload = match validate(&value, ValidationMode::Persistence) {
        Ok(payload) if extra.is_empty() => payload,
        Ok(_) => return Err(GenerationError::InputValidation(extra)),
        Err(GenerationError::InputValidation(mut violations)) => {
            violations.extend(extra);
            return Err(GenerationError::InputValidation(violations));
        }
        Err(other) => return Err(other),
    };

    let user_id = payload
        .user_id
        .ok_or_else(|| single_violation("user_id", "field is required"))?;
    let [introduction, steps, evaluation_rubric] = content;

    Ok(SaveLessonPlanRequest {
        payload,
        user_id,
        introduction,
        steps,
        evaluation_rubric,
    })
}

/// Validate an already-parsed JSON value.
pub fn validate(value: &Value, mode: ValidationMode) -> Result<RequestPayload, GenerationError> {
    let object = value
        .as_object()
        .ok_or_else(|| single_violation("body", "must be a JSON object"))?;

    let mut violations = Vec::new();

    let mut texts: Vec<String> = Vec::with_capacity(TEXT_FIELDS.len());
    for field in TEXT_FIELDS {
        match text_field(object, field) {
            Ok(text) => texts.push(text),
            Err(v) => {
                violations.push(v);
                texts.push(String::new());
            }
        }
    }

    let duration_minutes = match duration_field(object) {
        Ok(minutes) => minutes,
        Err(v) => {
            violations.push(v);
            0
        }
    };

    let user_id = match mode {
        ValidationMode::Generation => None,
        ValidationMode::Persistence => match user_id_field(object) {
            Ok(id) => Some(id),
            Err(v) => {
                violations.push(v);
                None
            }
        },
    };

    if !violations.is_empty() {
        return Err(GenerationError::InputValidation(violations));
    }

    let mut texts = texts.into_iter();
    let mut next = || texts.next().unwrap_or_default();
    Ok(RequestPayload {
        main_theme: next(),
        secondary_theme: next(),
        objective: next(),
        subject: next(),
        age_group: next(),
        resources: next(),
        duration_minutes,
        user_id,
    })
}

fn parse_body(body: &[u8]) -> Result<Value, GenerationError> {
    serde_json::from_slice(body)
        .map_err(|e| single_violation("body", format!("invalid JSON: {e}")))
}

fn single_violation(field: &str, problem: impl Into<String>) -> GenerationError {
    GenerationError::InputValidation(vec![FieldViolation::new(field, problem)])
}

fn text_field(object: &Map<String, Value>, field: &str) -> Result<String, FieldViolation> {
    match object.get(field) {
        None | Some(Value::Null) => Err(FieldViolation::new(field, "field is required")),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(FieldViolation::new(field, "must not be empty"))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(FieldViolation::new(field, "must be a string")),
    }
}

fn duration_field(object: &Map<String, Value>) -> Result<u32, FieldViolation> {
    const FIELD: &str = "duration_minutes";
    match object.get(FIELD) {
        None | Some(Value::Null) => Err(FieldViolation::new(FIELD, "field is required")),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(minutes) if minutes > 0 => u32::try_from(minutes)
                .map_err(|_| FieldViolation::new(FIELD, "is too large")),
            Some(_) => Err(FieldViolation::new(FIELD, "must be a positive integer")),
            None if n.as_u64().is_some() => Err(FieldViolation::new(FIELD, "is too large")),
            None => integral_float(n.as_f64()),
        },
        Some(_) => Err(FieldViolation::new(FIELD, "must be an integer")),
    }
}

/// JSON numbers such as `45.0` carry an integer value and are accepted.
fn integral_float(value: Option<f64>) -> Result<u32, FieldViolation> {
    const FIELD: &str = "duration_minutes";
    match value {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            if f <= 0.0 {
                Err(FieldViolation::new(FIELD, "must be a positive integer"))
            } else if f > f64::from(u32::MAX) {
                Err(FieldViolation::new(FIELD, "is too large"))
            } else {
                Ok(f as u32)
            }
        }
        _ => Err(FieldViolation::new(FIELD, "must be an integer")),
    }
}

fn user_id_field(object: &Map<String, Value>) -> Result<Uuid, FieldViolation> {
    const FIELD: &str = "user_id";
    match object.get(FIELD) {
        None | Some(Value::Null) => Err(FieldViolation::new(FIELD, "field is required")),
        Some(Value::String(s)) => Uuid::parse_str(s.trim())
            .map_err(|_| FieldViolation::new(FIELD, "invalid user ID format")),
        Some(_) => Err(FieldViolation::new(FIELD, "must be a string")),
    }
}
