//! Error taxonomy for the generation pipeline.
//!
//! Every stage of the pipeline fails with a [`GenerationError`]. The variant
//! decides the HTTP status and whether the internal detail may be shown to
//! the caller; the response shape itself is always the same (see
//! [`crate::response`]).

use std::fmt;

use thiserror::Error;

/// A single violated field in an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// JSON key of the offending field.
    pub field: String,
    /// Human-readable description of what is wrong with it.
    pub problem: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Coarse classification of a [`GenerationError`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Configuration,
    ModelInvocation,
    ResponseFormat,
    Domain,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InputValidation => "input_validation",
            Self::Configuration => "configuration",
            Self::ModelInvocation => "model_invocation",
            Self::ResponseFormat => "response_format",
            Self::Domain => "domain",
        };
        f.write_str(s)
    }
}

/// Errors produced anywhere in the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request payload is malformed, incomplete or out of range.
    #[error("invalid request payload: {}", join_violations(.0))]
    InputValidation(Vec<FieldViolation>),

    /// A deployment setting (e.g. the provider credential) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model provider call failed, timed out or returned no text.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// The model replied with text that does not contain the expected JSON.
    #[error("unexpected model response format: {0}")]
    ResponseFormat(String),

    /// The model reported the inputs as unusable via `mensagem_erro`.
    #[error("model rejected the request: {0}")]
    Domain(String),
}

/// Caller-facing messages for failures whose detail must stay internal.
pub const CONFIGURATION_MESSAGE: &str = "Server configuration error";
pub const MODEL_INVOCATION_MESSAGE: &str = "Failed to generate lesson plan";
pub const RESPONSE_FORMAT_MESSAGE: &str = "AI response not in expected JSON format";

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputValidation(_) => ErrorKind::InputValidation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ModelInvocation(_) => ErrorKind::ModelInvocation,
            Self::ResponseFormat(_) => ErrorKind::ResponseFormat,
            Self::Domain(_) => ErrorKind::Domain,
        }
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InputValidation(_) | Self::Domain(_) => 400,
            Self::Configuration(_) | Self::ModelInvocation(_) | Self::ResponseFormat(_) => 500,
        }
    }

    /// Whether the failure is caused by the caller's input rather than the server.
    pub fn is_caller_fault(&self) -> bool {
        self.status_code() < 500
    }

    /// Message safe to return to the caller.
    ///
    /// Validation and domain failures carry actionable detail; server-side
    /// failures collapse onto fixed generic messages.
    pub fn caller_message(&self) -> String {
        match self {
            Self::InputValidation(violations) => {
                format!("Invalid request payload: {}", join_violations(violations))
            }
            Self::Domain(message) => message.clone(),
            Self::Configuration(_) => CONFIGURATION_MESSAGE.to_string(),
            Self::ModelInvocation(_) => MODEL_INVOCATION_MESSAGE.to_string(),
            Self::ResponseFormat(_) => RESPONSE_FORMAT_MESSAGE.to_string(),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(GenerationError::InputValidation(vec![]).status_code(), 400);
        assert_eq!(GenerationError::Domain("x".into()).status_code(), 400);
        assert_eq!(GenerationError::Configuration("x".into()).status_code(), 500);
        assert_eq!(GenerationError::ModelInvocation("x".into()).status_code(), 500);
        assert_eq!(GenerationError::ResponseFormat("x".into()).status_code(), 500);
    }

    #[test]
    fn server_side_detail_is_not_exposed() {
        let err = GenerationError::Configuration("GEMINI_API_KEY is not set".into());
        assert_eq!(err.caller_message(), CONFIGURATION_MESSAGE);
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = GenerationError::ModelInvocation("connection refused to 10.0.0.3".into());
        assert!(!err.caller_message().contains("10.0.0.3"));
    }

    #[test]
    fn validation_message_lists_every_field() {
        let err = GenerationError::InputValidation(vec![
            FieldViolation::new("subject", "field is required"),
            FieldViolation::new("duration_minutes", "must be a positive integer"),
        ]);
        let msg = err.caller_message();
        assert!(msg.contains("subject: field is required"), "{msg}");
        assert!(msg.contains("duration_minutes: must be a positive integer"), "{msg}");
        assert!(err.is_caller_fault());
    }

    #[test]
    fn domain_message_is_passed_through() {
        let err = GenerationError::Domain("duration too short".into());
        assert_eq!(err.caller_message(), "duration too short");
        assert_eq!(err.kind(), ErrorKind::Domain);
    }
}
