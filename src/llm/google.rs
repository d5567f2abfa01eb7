// Google Gemini adapter
// API Reference: https://ai.google.dev/api/generate-content

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

// Request types for the Gemini API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// Response types
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GoogleAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, GOOGLE_API_BASE)
    }

    /// Point the adapter at a different endpoint (proxies, tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn convert_messages(request: &LLMRequest) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut system_text: Vec<String> = request.system_instruction.iter().cloned().collect();
        let mut contents = Vec::new();

        for msg in &request.messages {
            let role = match msg.role.as_str() {
                "system" => {
                    system_text.push(msg.content.clone());
                    continue;
                }
                "assistant" => "model",
                _ => "user",
            };
            contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            });
        }

        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_text.join("\n\n"),
                }],
            })
        };

        (contents, system_instruction)
    }
}

#[async_trait]
impl LLMAdapter for GoogleAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let (contents, system_instruction) = Self::convert_messages(request);

        let body = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(AppError::LLMApi(format!(
                    "Gemini API error ({}): {} (status: {:?})",
                    status, error_response.error.message, error_response.error.status
                )));
            }
            return Err(AppError::LLMApi(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Gemini response: {}", e)))?;

        let candidate = gemini_response
            .candidates
            .first()
            .ok_or_else(|| AppError::LLMApi("Gemini returned no candidates".to_string()))?;

        let content = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = gemini_response
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason: candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "STOP".to_string()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;

    fn request() -> LLMRequest {
        LLMRequest {
            provider: "google".to_string(),
            model: "gemini-2.5-flash".to_string(),
            messages: vec![
                LLMMessage::system("You are a validator."),
                LLMMessage::user("Check this report"),
            ],
            max_tokens: Some(256),
            temperature: Some(0.2),
            system_instruction: None,
        }
    }

    #[test]
    fn test_system_messages_become_system_instruction() {
        let (contents, system) = GoogleAdapter::convert_messages(&request());
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        let system = system.unwrap();
        assert_eq!(system.parts[0].text, "You are a validator.");
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Final Answer: "},{"text":"all good"}]},"finishReason":"STOP"}],
                    "usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":4,"totalTokenCount":14}}"#,
            )
            .create_async()
            .await;

        let adapter = GoogleAdapter::with_base_url("test-key", &server.url());
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Final Answer: all good");
        assert_eq!(response.finish_reason, "STOP");
        assert_eq!(response.usage.total_tokens, 14);
    }

    #[tokio::test]
    async fn test_generate_content_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let adapter = GoogleAdapter::with_base_url("test-key", &server.url());
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_generate_content_without_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let adapter = GoogleAdapter::with_base_url("test-key", &server.url());
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
    }
}
