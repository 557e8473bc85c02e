//! Lesson-plan generation core.
//!
//! Validates pedagogical parameters, composes the model instruction, calls
//! the model through a [`gateway::ModelGateway`], and turns its untrusted
//! reply into a [`output::GeneratedContent`] or a classified
//! [`error::GenerationError`].

pub mod error;
pub mod extract;
pub mod gateway;
pub mod output;
pub mod payload;
pub mod prompt;
pub mod response;
pub mod service;
pub mod store;

pub use error::{FieldViolation, GenerationError};
pub use output::GeneratedContent;
pub use response::{ExternalError, LessonPlanResponse};
pub use service::LessonPlanService;
