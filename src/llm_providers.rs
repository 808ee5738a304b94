use anyhow::Result;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::errors::QuizError;
use crate::key_rotator::KeyRotator;
use crate::{log_llm_operation, log_service_warn};

pub const GEMINI_PROVIDER: &str = "Gemini";
pub const CHAT_PROVIDER: &str = "OpenRouter";

/// Shared HTTP client with a bounded per-request timeout
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

// ============================================================================
// Gemini (document-capable generation API)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String, // base64
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Decode `candidates[0].content.parts[0].text`
pub fn extract_gemini_text(body: &str) -> Result<String, QuizError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| QuizError::malformed(GEMINI_PROVIDER, format!("invalid response envelope: {}", e)))?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| QuizError::malformed(GEMINI_PROVIDER, "no candidates in response"))?;

    let part = candidate
        .content
        .ok_or_else(|| QuizError::malformed(GEMINI_PROVIDER, "candidate has no content"))?
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| QuizError::malformed(GEMINI_PROVIDER, "no parts in candidate content"))?;

    part.text
        .ok_or_else(|| QuizError::malformed(GEMINI_PROVIDER, "first part has no text"))
}

/// Gemini `generateContent` client; every call takes the next key from the rotator
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    keys: KeyRotator,
}

impl GeminiProvider {
    pub fn new(client: Client, endpoint: String, keys: KeyRotator) -> Self {
        Self {
            client,
            endpoint,
            keys,
        }
    }

    pub async fn generate(&self, operation: &str, request: &GeminiRequest) -> Result<String, QuizError> {
        let key = self.keys.next();
        let started = Instant::now();

        log_llm_operation!(
            start,
            operation,
            provider = GEMINI_PROVIDER,
            key_slot = key.slot
        );

        let builder = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key.key)])
            .json(request);

        let body = dispatch(GEMINI_PROVIDER, operation, builder).await?;
        let text = extract_gemini_text(&body)?;

        log_llm_operation!(
            success,
            operation,
            provider = GEMINI_PROVIDER,
            duration_ms = started.elapsed().as_millis() as u64,
            response_length = text.len()
        );
        Ok(text)
    }

    pub fn provider_name(&self) -> &'static str {
        GEMINI_PROVIDER
    }

    pub fn key_count(&self) -> usize {
        self.keys.key_count()
    }
}

// ============================================================================
// Chat completions (OpenAI-compatible, e.g. OpenRouter)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Decode `choices[0].message.content`
pub fn extract_chat_text(body: &str) -> Result<String, QuizError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| QuizError::malformed(CHAT_PROVIDER, format!("invalid response envelope: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuizError::malformed(CHAT_PROVIDER, "no choices in response"))?
        .message
        .ok_or_else(|| QuizError::malformed(CHAT_PROVIDER, "first choice has no message"))?
        .content
        .ok_or_else(|| QuizError::malformed(CHAT_PROVIDER, "message has no content"))
}

/// Identification headers some chat gateways ask clients to send
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub referer: String,
    pub title: String,
}

#[derive(Clone)]
pub struct ChatProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    identity: ClientIdentity,
}

impl ChatProvider {
    pub fn new(
        client: Client,
        endpoint: String,
        api_key: String,
        model: String,
        identity: ClientIdentity,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model,
            identity,
        }
    }

    pub async fn complete(&self, operation: &str, request: &ChatRequest) -> Result<String, QuizError> {
        let started = Instant::now();

        log_llm_operation!(
            start,
            operation,
            provider = CHAT_PROVIDER,
            key_slot = 0usize
        );

        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.identity.referer)
            .header("X-Title", &self.identity.title)
            .json(request);

        let body = dispatch(CHAT_PROVIDER, operation, builder).await?;
        let text = extract_chat_text(&body)?;

        log_llm_operation!(
            success,
            operation,
            provider = CHAT_PROVIDER,
            duration_ms = started.elapsed().as_millis() as u64,
            response_length = text.len()
        );
        Ok(text)
    }

    pub fn provider_name(&self) -> &'static str {
        CHAT_PROVIDER
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Send one POST and return the raw body of a 2xx response. No retries.
async fn dispatch(
    provider: &'static str,
    operation: &str,
    builder: RequestBuilder,
) -> Result<String, QuizError> {
    let response = builder.send().await.map_err(|e| {
        let cause = if e.is_timeout() {
            format!("request timed out: {}", e.without_url())
        } else {
            format!("transport error: {}", e.without_url())
        };
        error!(provider, operation, error = %cause, "LLM API request failed");
        QuizError::upstream(provider, cause)
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        QuizError::upstream(provider, format!("failed to read response body: {}", e.without_url()))
    })?;

    if !status.is_success() {
        error!(
            provider,
            operation,
            status = %status,
            error = %body,
            "LLM API request failed"
        );
        return Err(QuizError::upstream(
            provider,
            format!("status {}: {}", status, body),
        ));
    }

    if body.trim().is_empty() {
        log_service_warn!(provider, operation, "empty response body");
    }
    debug!(provider, operation, body_length = body.len(), "Received LLM response body");

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_gemini_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"hello"},{"text":"ignored"}],"role":"model"}}]}"#;
        assert_eq!(extract_gemini_text(body).unwrap(), "hello");
    }

    #[test]
    fn test_gemini_envelope_failures_are_malformed() {
        let bodies = [
            r#"{"candidates":[]}"#,
            r#"{}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#,
            r#"{"candidates":"nope"}"#,
            "<html>bad gateway</html>",
        ];

        for body in bodies {
            let err = extract_gemini_text(body).unwrap_err();
            assert!(
                matches!(err, QuizError::MalformedUpstreamResponse { provider: "Gemini", .. }),
                "{} should be malformed, got {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn test_extract_chat_text() {
        let body = r#"{"id":"gen-1","choices":[{"index":0,"message":{"role":"assistant","content":"Focus on fractions."}}]}"#;
        assert_eq!(extract_chat_text(body).unwrap(), "Focus on fractions.");
    }

    #[test]
    fn test_chat_envelope_failures_are_malformed() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"index":0}]}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            "not json",
        ] {
            assert!(matches!(
                extract_chat_text(body),
                Err(QuizError::MalformedUpstreamResponse { provider: "OpenRouter", .. })
            ));
        }
    }

    #[test]
    fn test_gemini_part_serialization() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text { text: "prompt".into() },
                    GeminiPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [{"parts": [
                    {"text": "prompt"},
                    {"inline_data": {"mime_type": "application/pdf", "data": "AAAA"}}
                ]}]
            })
        );
    }
}
