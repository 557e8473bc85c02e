//! Gemini gateway adapter.
//!
//! Calls the `models/{model}:generateContent` REST endpoint and returns the
//! concatenated text parts of the first candidate.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::trait_def::ModelGateway;
use super::types::{GatewayConfig, GatewayError, GenerationConfig};
use crate::prompt::ComposedPrompt;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest provider error body echoed into an internal error message.
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Request / response translation
// ---------------------------------------------------------------------------

pub(crate) fn build_request(
    prompt: &ComposedPrompt,
    config: &GenerationConfig,
) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: Some(prompt.system_instruction.clone()),
                thought: None,
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(prompt.user_instruction.clone()),
                thought: None,
            }],
        }],
        generation_config: WireGenerationConfig {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            thinking_config: config
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
        },
    }
}

/// Pull the answer text out of a decoded response.
pub(crate) fn response_text(response: &GenerateContentResponse) -> Result<String, GatewayError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GatewayError::Invocation(format!(
            "prompt blocked by provider: {reason}"
        )));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GatewayError::EmptyResponse("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter(|p| !p.thought.unwrap_or(false))
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GatewayError::EmptyResponse(format!(
            "candidate has no text (finish reason: {reason})"
        )));
    }

    Ok(text.trim().to_string())
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// [`ModelGateway`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    config: GatewayConfig,
    client: Client,
}

impl GeminiGateway {
    /// Build a gateway. The credential is not checked here; a missing key
    /// is reported by [`ModelGateway::generate`] before any network I/O.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Invocation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.generation.model
        )
    }

    fn api_key(&self) -> Result<&str, GatewayError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                GatewayError::MissingCredential(
                    "no Gemini API key configured (set GEMINI_API_KEY)".to_string(),
                )
            })
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GatewayError> {
        let api_key = self.api_key()?;
        let body = build_request(prompt, &self.config.generation);

        debug!(model = %self.config.generation.model, "calling generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.config.timeout)
                } else {
                    GatewayError::Invocation(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut detail = response.text().await.unwrap_or_default();
            if detail.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !detail.is_char_boundary(cut) {
                    cut -= 1;
                }
                detail.truncate(cut);
            }
            warn!(%status, "model provider returned an error status");
            return Err(GatewayError::Invocation(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let decoded: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.config.timeout)
            } else {
                GatewayError::Invocation(format!("undecodable provider response: {e}"))
            }
        })?;

        response_text(&decoded)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt() -> ComposedPrompt {
        ComposedPrompt {
            system_instruction: "persona".to_string(),
            user_instruction: "tarefa".to_string(),
        }
    }

    fn decode(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("valid response json")
    }

    #[test]
    fn request_body_uses_provider_field_names() {
        let body = serde_json::to_value(build_request(&prompt(), &GenerationConfig::default()))
            .unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "persona");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "tarefa");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 800);
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn thinking_config_omitted_when_unset() {
        let config = GenerationConfig {
            thinking_budget: None,
            ..GenerationConfig::default()
        };
        let body = serde_json::to_value(build_request(&prompt(), &config)).unwrap();
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts_and_skips_thoughts() {
        let resp = decode(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "pensando...", "thought": true },
                    { "text": "{\"a\":" },
                    { "text": "1}" }
                ]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(response_text(&resp).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn response_text_reports_missing_candidates() {
        let err = response_text(&decode(json!({ "candidates": [] }))).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse(_)));
    }

    #[test]
    fn response_text_reports_blocked_prompt() {
        let err = response_text(&decode(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .unwrap_err();
        assert!(err.to_string().contains("SAFETY"), "{err}");
    }

    #[test]
    fn response_text_reports_empty_candidate_with_reason() {
        let err = response_text(&decode(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"), "{err}");
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        // Unroutable base URL: reaching the network would surface as an
        // invocation error instead of a credential error.
        let config = GatewayConfig::new(Some("   ".into())).with_base_url("http://192.0.2.1:9");
        let gateway = GeminiGateway::new(config).unwrap();
        let err = gateway.generate(&prompt()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential(_)), "{err:?}");
    }

    #[test]
    fn endpoint_includes_model() {
        let gateway = GeminiGateway::new(GatewayConfig::new(None)).unwrap();
        assert_eq!(
            gateway.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
