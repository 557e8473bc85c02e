//! External response shapes.
//!
//! The generation endpoint answers every request, success or failure, with
//! the five-key [`GeneratedContent`] body so clients need a single
//! deserializer. [`ExternalError`] is the `{message, statusCode, details}`
//! envelope used by the persistence path.

use serde::Serialize;

use crate::error::GenerationError;
use crate::output::GeneratedContent;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_METHOD_NOT_ALLOWED: u16 = 405;

/// Message returned for unsupported HTTP methods.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// Status code plus body for the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPlanResponse {
    pub status: u16,
    pub body: GeneratedContent,
}

impl LessonPlanResponse {
    /// Map a pipeline outcome onto the uniform response.
    pub fn from_result(result: Result<GeneratedContent, GenerationError>) -> Self {
        match result {
            Ok(content) => Self::success(content),
            Err(err) => Self::from_error(&err),
        }
    }

    /// A successful body. A failure-shaped value is reported as a domain
    /// error instead, so a 200 never carries `mensagem_erro`.
    pub fn success(content: GeneratedContent) -> Self {
        match content.into_result() {
            Ok(content) => Self {
                status: STATUS_OK,
                body: content,
            },
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn from_error(err: &GenerationError) -> Self {
        Self {
            status: err.status_code(),
            body: GeneratedContent::failure(err.caller_message()),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: STATUS_METHOD_NOT_ALLOWED,
            body: GeneratedContent::failure(METHOD_NOT_ALLOWED_MESSAGE),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Error envelope for failures that bypass the [`GeneratedContent`] shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalError {
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ExternalError {
    pub fn new(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for ExternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code)?;
        if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExternalError {}
