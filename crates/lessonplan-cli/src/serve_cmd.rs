use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use lessonplan_core::{FieldViolation, GenerationError, LessonPlanResponse, LessonPlanService};

/// Path of the generation endpoint.
pub const GENERATE_PATH: &str = "/generate-lesson-plan";

// ---------------------------------------------------------------------------
// Response type
// ---------------------------------------------------------------------------

/// Uniform five-key body with its HTTP status.
pub struct ApiResponse(LessonPlanResponse);

impl IntoResponse for ApiResponse {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: LessonPlanService) -> Router {
    Router::new()
        .route(
            GENERATE_PATH,
            post(generate_lesson_plan).fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: LessonPlanService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {bind}:{port}"))?;
    tracing::info!("lessonplan serve listening on http://{addr}{GENERATE_PATH}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("lessonplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// The body is taken as raw bytes so malformed JSON gets the same
/// five-key 400 as any other validation failure. A body that cannot be
/// read at all (e.g. over the size limit) is reported the same way.
async fn generate_lesson_plan(
    State(service): State<LessonPlanService>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    match body {
        Ok(body) => ApiResponse(service.respond(&body).await),
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), "request body rejected");
            let err = GenerationError::InputValidation(vec![FieldViolation::new(
                "body",
                rejection.body_text(),
            )]);
            ApiResponse(LessonPlanResponse::from_error(&err))
        }
    }
}

async fn method_not_allowed() -> ApiResponse {
    ApiResponse(LessonPlanResponse::method_not_allowed())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use lessonplan_core::LessonPlanService;
    use lessonplan_core::gateway::GatewayError;
    use lessonplan_test_utils::{FakeGateway, sample_reply, sample_request_bytes};

    use super::GENERATE_PATH;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send_request(
        gateway: &FakeGateway,
        method: Method,
        uri: &str,
        body: Vec<u8>,
    ) -> axum::response::Response {
        let app = super::build_router(LessonPlanService::new(Arc::new(gateway.clone())));
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_five_keys(body: &serde_json::Value) {
        let obj = body.as_object().expect("body is an object");
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["evaluation_rubric", "intro_ludica", "mensagem_erro", "objetivo_bncc", "steps"]
        );
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_success() {
        let gateway = FakeGateway::replying_json(&sample_reply());
        let resp = send_request(&gateway, Method::POST, GENERATE_PATH, sample_request_bytes()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_five_keys(&body);
        assert_eq!(body["steps"], sample_reply()["steps"]);
        assert_eq!(body["mensagem_erro"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_generate_malformed_json_is_400() {
        let gateway = FakeGateway::new();
        let resp = send_request(&gateway, Method::POST, GENERATE_PATH, b"{not json".to_vec()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_five_keys(&body);
        assert_eq!(body["steps"], serde_json::Value::Null);
        assert!(body["mensagem_erro"].as_str().unwrap().starts_with("Invalid request payload"));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_domain_error_is_400() {
        let gateway = FakeGateway::replying_json(&json!({
            "intro_ludica": "x",
            "objetivo_bncc": "x",
            "steps": "x",
            "evaluation_rubric": "x",
            "mensagem_erro": "tema incompatível com a faixa etária"
        }));
        let resp = send_request(&gateway, Method::POST, GENERATE_PATH, sample_request_bytes()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["intro_ludica"], serde_json::Value::Null);
        assert_eq!(body["mensagem_erro"], "tema incompatível com a faixa etária");
    }

    #[tokio::test]
    async fn test_generate_gateway_failure_is_500() {
        let gateway = FakeGateway::failing(GatewayError::Invocation("upstream 503".into()));
        let resp = send_request(&gateway, Method::POST, GENERATE_PATH, sample_request_bytes()).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_five_keys(&body);
        assert_eq!(body["mensagem_erro"], "Failed to generate lesson plan");
    }

    #[tokio::test]
    async fn test_oversized_body_keeps_the_five_key_shape() {
        let gateway = FakeGateway::new();
        let mut request: serde_json::Value =
            serde_json::from_slice(&sample_request_bytes()).unwrap();
        request["resources"] = json!("x".repeat(3 * 1024 * 1024));
        let resp = send_request(
            &gateway,
            Method::POST,
            GENERATE_PATH,
            serde_json::to_vec(&request).unwrap(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_five_keys(&body);
        assert_eq!(body["steps"], serde_json::Value::Null);
        let message = body["mensagem_erro"].as_str().unwrap();
        assert!(message.starts_with("Invalid request payload: body:"), "{message}");
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_are_405() {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let gateway = FakeGateway::new();
            let resp = send_request(&gateway, method.clone(), GENERATE_PATH, Vec::new()).await;

            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            let body = body_json(resp).await;
            assert_five_keys(&body);
            assert_eq!(body["mensagem_erro"], "Method Not Allowed");
            assert_eq!(gateway.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let gateway = FakeGateway::replying_json(&sample_reply());
        let app = super::build_router(LessonPlanService::new(Arc::new(gateway)));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(GENERATE_PATH)
                    .header("origin", "https://example.org")
                    .body(Body::from(sample_request_bytes()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_health() {
        let gateway = FakeGateway::new();
        let resp = send_request(&gateway, Method::GET, "/health", Vec::new()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
    }
}
