//! The generation pipeline.
//!
//! Validator -> Composer -> Gateway -> Extractor -> OutputValidator ->
//! Builder, strictly linear per request. The service holds no mutable
//! state, so one instance is shared by every concurrent request.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::GenerationError;
use crate::extract::extract_json;
use crate::gateway::ModelGateway;
use crate::output::{GeneratedContent, validate_output};
use crate::payload::{RequestPayload, validate_generation_payload};
use crate::prompt::compose;
use crate::response::LessonPlanResponse;

/// Lesson-plan generation service.
#[derive(Clone)]
pub struct LessonPlanService {
    gateway: Arc<dyn ModelGateway>,
}

impl std::fmt::Debug for LessonPlanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonPlanService")
            .field("gateway", &self.gateway.name())
            .finish()
    }
}

impl LessonPlanService {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Run the pipeline on a raw request body.
    ///
    /// Returns populated content, or the first stage failure. A model
    /// reply carrying `mensagem_erro` is returned as
    /// [`GenerationError::Domain`].
    pub async fn generate(&self, body: &[u8]) -> Result<GeneratedContent, GenerationError> {
        let payload = validate_generation_payload(body)?;
        self.generate_for(&payload).await
    }

    /// Run the pipeline from an already-validated payload.
    pub async fn generate_for(
        &self,
        payload: &RequestPayload,
    ) -> Result<GeneratedContent, GenerationError> {
        let prompt = compose(payload);

        let raw = self.gateway.generate(&prompt).await?;
        debug!(gateway = self.gateway.name(), raw = %raw, "model reply received");

        if raw.trim().is_empty() {
            return Err(GenerationError::ModelInvocation(
                "empty response from model".to_string(),
            ));
        }

        let value = extract_json(&raw)?;
        validate_output(&value)?.into_result()
    }

    /// Run the pipeline and build the external response, logging the
    /// internal detail of any failure.
    pub async fn respond(&self, body: &[u8]) -> LessonPlanResponse {
        let result = self.generate(body).await;
        if let Err(err) = &result {
            log_failure(err);
        }
        let response = LessonPlanResponse::from_result(result);
        info!(status = response.status, "lesson plan request completed");
        response
    }
}

fn log_failure(err: &GenerationError) {
    let kind = err.kind();
    if err.is_caller_fault() {
        warn!(%kind, error = %err, "lesson plan request rejected");
    } else {
        error!(%kind, error = %err, "lesson plan generation failed");
    }
}
