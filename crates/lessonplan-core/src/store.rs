//! Collaborator interfaces for storing lesson plans.
//!
//! Storage, querying and access control live outside this crate. This
//! module defines the narrow seam the service talks through
//! ([`LessonPlanStore`]) and the request handling in front of it: payload
//! validation for the persistence path, bearer identity extraction and
//! error mapping onto [`ExternalError`].

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::payload::{RequestPayload, SaveLessonPlanRequest, validate_persistence_payload};
use crate::response::{ExternalError, STATUS_CREATED};

/// Opaque, already-validated caller identity (e.g. a bearer token).
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CallerIdentity(<redacted>)")
    }
}

/// Row handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLessonPlan {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub payload: RequestPayload,
    pub introduction: Option<String>,
    pub steps: Option<String>,
    pub evaluation_rubric: Option<String>,
}

impl From<SaveLessonPlanRequest> for NewLessonPlan {
    fn from(req: SaveLessonPlanRequest) -> Self {
        let mut payload = req.payload;
        // Carried once, at the top level.
        payload.user_id = None;
        Self {
            user_id: req.user_id,
            payload,
            introduction: req.introduction,
            steps: req.steps,
            evaluation_rubric: req.evaluation_rubric,
        }
    }
}

/// Identifier of a stored lesson plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoredLessonPlanId(pub Uuid);

/// Failures reported by a [`LessonPlanStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the write for this identity (e.g. row-level policy).
    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator.
#[async_trait]
pub trait LessonPlanStore: Send + Sync {
    async fn insert(
        &self,
        identity: &CallerIdentity,
        record: &NewLessonPlan,
    ) -> Result<StoredLessonPlanId, StoreError>;
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedLessonPlan {
    #[serde(skip)]
    pub status: u16,
    pub id: StoredLessonPlanId,
}

/// Extract the identity from an `Authorization: Bearer <token>` header.
pub fn parse_bearer(header: Option<&str>) -> Result<CallerIdentity, ExternalError> {
    let header = header.ok_or_else(|| {
        ExternalError::new("Authentication required", 401)
            .with_details("Missing Authorization header")
    })?;
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(CallerIdentity::new(token)),
        _ => Err(ExternalError::new("Authentication required", 401)
            .with_details("Invalid Authorization header format. Expected 'Bearer <token>'")),
    }
}

/// Validate a save request and hand it to the store.
pub async fn save_lesson_plan(
    store: &dyn LessonPlanStore,
    authorization: Option<&str>,
    body: &[u8],
) -> Result<SavedLessonPlan, ExternalError> {
    let request = validate_persistence_payload(body).map_err(|err| match err {
        GenerationError::InputValidation(violations) => {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            ExternalError::new("Invalid request payload", 400).with_details(details)
        }
        other => ExternalError::new("Invalid request payload", 400).with_details(other.to_string()),
    })?;

    let identity = parse_bearer(authorization)?;
    let record = NewLessonPlan::from(request);

    match store.insert(&identity, &record).await {
        Ok(id) => Ok(SavedLessonPlan {
            status: STATUS_CREATED,
            id,
        }),
        Err(StoreError::Rejected(detail)) => {
            warn!(user_id = %record.user_id, %detail, "lesson plan write rejected");
            Err(ExternalError::new("Failed to save lesson plan", 403).with_details(detail))
        }
        Err(StoreError::Unavailable(detail)) => {
            error!(%detail, "lesson plan store unavailable");
            Err(ExternalError::new("An unexpected error occurred", 500))
        }
    }
}
