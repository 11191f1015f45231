/// LLM Client — the single point of entry for generative-AI calls.
///
/// No other module may call the AI service directly. Calls are never retried:
/// every failure is surfaced to the caller immediately.
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response envelope is not valid JSON: {0}")]
    Envelope(serde_json::Error),

    #[error("response envelope contains no generated text")]
    EmptyContent,

    #[error("generated text is not the expected JSON: {0}")]
    Content(serde_json::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

/// A parsed reply together with the envelope it came in.
#[derive(Debug, Clone)]
pub struct Generation<T> {
    pub envelope: Value,
    pub content: T,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one prompt, asking for a JSON reply, and returns the raw envelope.
    pub async fn call(&self, prompt: &str) -> Result<Value, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("AI service returned {status}");
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Value = serde_json::from_str(&body).map_err(LlmError::Envelope)?;

        if let Some(tokens) = envelope.pointer("/usageMetadata/totalTokenCount") {
            debug!("AI call succeeded: total_tokens={tokens}");
        }

        Ok(envelope)
    }

    /// Calls the service and deserializes the generated text as `T`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<Generation<T>, LlmError> {
        let envelope = self.call(prompt).await?;
        let content = parse_envelope_text(&envelope)?;
        Ok(Generation { envelope, content })
    }
}

/// The generated text at `candidates[0].content.parts[0].text`.
pub fn envelope_text(envelope: &Value) -> Option<&str> {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
}

fn parse_envelope_text<T: DeserializeOwned>(envelope: &Value) -> Result<T, LlmError> {
    let text = envelope_text(envelope).ok_or(LlmError::EmptyContent)?;
    serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Content)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(stripped)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::test_support::{envelope_with_text, MockUpstream};

    fn config_for(api_base: &str) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            api_base: api_base.to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Greeting {
        hello: String,
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_request_body_matches_wire_format() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{"parts": [{"text": "hi"}]}],
                "generationConfig": {"responseMimeType": "application/json"}
            })
        );
    }

    #[test]
    fn test_envelope_text_reads_first_part() {
        let envelope = envelope_with_text("{\"hello\":\"world\"}");
        assert_eq!(envelope_text(&envelope), Some("{\"hello\":\"world\"}"));
        assert_eq!(envelope_text(&json!({"candidates": []})), None);
    }

    #[test]
    fn test_endpoint_joins_base_and_model() {
        let client = LlmClient::new(&config_for("http://localhost:9999/v1beta/")).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/test-model:generateContent"
        );
    }

    #[tokio::test]
    async fn test_call_json_parses_generated_text() {
        let upstream =
            MockUpstream::start(StatusCode::OK, envelope_with_text("{\"hello\":\"world\"}")).await;
        let client = LlmClient::new(&config_for(&upstream.base_url)).unwrap();

        let generation: Generation<Greeting> = client.call_json("prompt").await.unwrap();

        assert_eq!(generation.content.hello, "world");
        assert!(generation.envelope.get("candidates").is_some());
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error_with_google_message() {
        let upstream = MockUpstream::start(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid"}}),
        )
        .await;
        let client = LlmClient::new(&config_for(&upstream.base_url)).unwrap();

        let err = client.call_json::<Greeting>("prompt").await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(upstream.hits(), 1, "failures must not be retried");
    }

    #[tokio::test]
    async fn test_missing_text_is_empty_content() {
        let upstream = MockUpstream::start(StatusCode::OK, json!({"candidates": []})).await;
        let client = LlmClient::new(&config_for(&upstream.base_url)).unwrap();

        let err = client.call_json::<Greeting>("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        // Port 1 on loopback refuses connections.
        let client = LlmClient::new(&config_for("http://127.0.0.1:1")).unwrap();
        let err = client.call("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
