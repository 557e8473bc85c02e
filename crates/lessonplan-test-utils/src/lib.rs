//! Shared test utilities for lessonplan integration tests.
//!
//! Provides a scripted [`FakeGateway`] that records every prompt it
//! receives, an in-memory [`FakeStore`], and canonical request/reply
//! fixtures.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use lessonplan_core::gateway::{GatewayError, ModelGateway};
use lessonplan_core::prompt::ComposedPrompt;
use lessonplan_core::store::{
    CallerIdentity, LessonPlanStore, NewLessonPlan, StoreError, StoredLessonPlanId,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// The canonical valid request body.
pub fn sample_request() -> Value {
    json!({
        "main_theme": "Climate Change",
        "secondary_theme": "Climate Change",
        "objective": "Teach children about warming",
        "subject": "Geography",
        "age_group": "8th grade",
        "resources": "Whiteboard",
        "duration_minutes": 45
    })
}

/// [`sample_request`] as bytes.
pub fn sample_request_bytes() -> Vec<u8> {
    serde_json::to_vec(&sample_request()).expect("fixture serializes")
}

/// A well-formed model reply with every content field populated.
pub fn sample_reply() -> Value {
    json!({
        "intro_ludica": "Imagine que a Terra está com febre...",
        "objetivo_bncc": "EF08GE17: analisar mudanças climáticas",
        "steps": "- Passo 1: roda de conversa\n- Passo 2: experimento\n- Passo 3: síntese",
        "evaluation_rubric": "Critério 1: participação\nCritério 2: explicação do efeito estufa",
        "mensagem_erro": null
    })
}

// ---------------------------------------------------------------------------
// FakeGateway
// ---------------------------------------------------------------------------

/// Scripted model gateway.
///
/// Replies are consumed in order; once exhausted every further call fails
/// with an invocation error. Every received prompt is recorded.
#[derive(Clone, Default)]
pub struct FakeGateway {
    replies: Arc<Mutex<VecDeque<Result<String, GatewayError>>>>,
    prompts: Arc<Mutex<Vec<ComposedPrompt>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that answers once with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        let gateway = Self::new();
        gateway
            .replies
            .try_lock()
            .expect("fresh gateway is unlocked")
            .push_back(Ok(text.into()));
        gateway
    }

    /// A gateway that answers once with `value` serialized as JSON.
    pub fn replying_json(value: &Value) -> Self {
        Self::replying(value.to_string())
    }

    /// A gateway that fails once with `err`.
    pub fn failing(err: GatewayError) -> Self {
        let gateway = Self::new();
        gateway
            .replies
            .try_lock()
            .expect("fresh gateway is unlocked")
            .push_back(Err(err));
        gateway
    }

    pub async fn push_reply(&self, reply: Result<String, GatewayError>) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<ComposedPrompt> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ModelGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.clone());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Invocation("no scripted reply left".into())))
    }
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

/// In-memory [`LessonPlanStore`] that records inserts.
#[derive(Clone, Default)]
pub struct FakeStore {
    records: Arc<Mutex<Vec<(String, NewLessonPlan)>>>,
    failure: Option<fn() -> StoreError>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every insert fails with the error built by `make`.
    pub fn failing_with(make: fn() -> StoreError) -> Self {
        Self {
            records: Arc::default(),
            failure: Some(make),
        }
    }

    /// Inserted records with the token they were written under.
    pub async fn records(&self) -> Vec<(String, NewLessonPlan)> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl LessonPlanStore for FakeStore {
    async fn insert(
        &self,
        identity: &CallerIdentity,
        record: &NewLessonPlan,
    ) -> Result<StoredLessonPlanId, StoreError> {
        if let Some(make) = self.failure {
            return Err(make());
        }
        let mut records = self.records.lock().await;
        records.push((identity.as_str().to_string(), record.clone()));
        Ok(StoredLessonPlanId(uuid_for(records.len())))
    }
}

/// Deterministic ids so tests can assert on them.
fn uuid_for(n: usize) -> Uuid {
    Uuid::from_u128(n as u128)
}
