use std::io::Read;

use anyhow::{Context, Result};

use lessonplan_core::LessonPlanService;

/// Read a request body from `path`, or from stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read request body from stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read request body from {path}"))
}

/// Run one request through the pipeline and print the five-key body.
///
/// Returns whether the request succeeded.
pub async fn run_generate(service: &LessonPlanService, body: &[u8]) -> Result<bool> {
    let response = service.respond(body).await;
    let rendered =
        serde_json::to_string_pretty(&response.body).context("failed to render response")?;
    println!("{rendered}");
    if !response.is_success() {
        eprintln!("request failed with status {}", response.status);
    }
    Ok(response.is_success())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lessonplan_test_utils::{FakeGateway, sample_reply, sample_request_bytes};

    use super::*;

    #[test]
    fn read_input_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("request.json");
        std::fs::write(&path, sample_request_bytes()).unwrap();

        let body = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(body, sample_request_bytes());
    }

    #[test]
    fn read_input_missing_file_names_the_path() {
        let msg = read_input("/definitely/not/here.json")
            .unwrap_err()
            .to_string();
        assert!(msg.contains("/definitely/not/here.json"), "{msg}");
    }

    #[tokio::test]
    async fn run_generate_reports_success() {
        let gateway = FakeGateway::replying_json(&sample_reply());
        let service = LessonPlanService::new(Arc::new(gateway));
        assert!(run_generate(&service, &sample_request_bytes()).await.unwrap());
    }

    #[tokio::test]
    async fn run_generate_reports_failure() {
        let gateway = FakeGateway::new();
        let service = LessonPlanService::new(Arc::new(gateway.clone()));
        assert!(!run_generate(&service, b"[]").await.unwrap());
        assert_eq!(gateway.calls(), 0);
    }
}
