use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::relevance::{parse_relevance, Relevance};
use crate::report::Summary;

const MIN_SUMMARY_INPUT_CHARS: usize = 10;
const GEMINI_MAX_TEMPERATURE: f32 = 0.6;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{0} is not set")]
    MissingCredentials(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM provider returned error: {0}")]
    Provider(String),

    #[error("LLM response missing content: {0}")]
    EmptyResponse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Builds the request body, applying the Gemini-family adjustments.
pub fn build_payload(
    model: &str,
    messages: &[ChatMessage],
    max_tokens: u32,
    temperature: f32,
) -> ChatPayload {
    let mut payload = ChatPayload {
        model: model.to_string(),
        messages: messages.to_vec(),
        max_tokens,
        temperature,
        response_format: None,
    };

    if model.to_lowercase().contains("gemini") {
        payload.temperature = temperature.min(GEMINI_MAX_TEMPERATURE);
        if messages.iter().any(|m| m.content.contains("JSON")) {
            payload.response_format = Some(ResponseFormat {
                kind: "json_object".to_string(),
            });
        }
    }

    payload
}

pub struct LlmClient {
    client: Client,
    api_base: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    summary_words: u32,
}

impl LlmClient {
    /// Validates the API key and prepares the HTTP client. No request is sent.
    pub fn authenticate(config: &LlmConfig, timeout_secs: Option<u64>) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                tracing::error!("Missing OpenRouter API key (OPENROUTER_API_KEY)");
                LlmError::MissingCredentials("OPENROUTER_API_KEY".to_string())
            })?;

        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        tracing::debug!(api_base = %config.api_base, "LLM client configured");

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: api_key.to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            summary_words: config.summary_words,
        })
    }

    pub async fn request(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let payload = build_payload(model, messages, max_tokens, temperature);

        tracing::info!("Making request to LLM gateway using model: {}", model);
        tracing::debug!(
            temperature = payload.temperature,
            json_mode = payload.response_format.is_some(),
            "Chat completion payload prepared"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let v: Value = response.json().await?;
        extract_content(&v)
    }

    pub async fn summarize(&self, text: &str, model: &str) -> Summary {
        if text.trim().chars().count() < MIN_SUMMARY_INPUT_CHARS {
            tracing::warn!("Text too short to summarize");
            return Summary::TooShort;
        }

        let messages = vec![
            ChatMessage::system(
                "You are a concise summarization assistant. Create clear, brief summaries \
                 that capture the main points accurately.",
            ),
            ChatMessage::user(format!(
                "Summarize the following text in {} words or less. Focus on the key information:\n\n\
                 TEXT TO SUMMARIZE:\n{}\n\nSUMMARY:",
                self.summary_words, text
            )),
        ];

        match self
            .request(&messages, model, self.max_tokens, self.temperature)
            .await
        {
            Ok(content) => {
                let summary = content.trim().to_string();
                tracing::info!(
                    "Successfully summarized text ({} chars -> {} chars)",
                    text.len(),
                    summary.len()
                );
                Summary::Text(summary)
            }
            Err(err) => {
                tracing::error!(error = %err, model, "Failed to get summary from LLM gateway");
                Summary::Unavailable
            }
        }
    }

    pub async fn classify_relevance(&self, post: &str, comment: &str, model: &str) -> Relevance {
        if post.trim().is_empty() || comment.trim().is_empty() {
            tracing::warn!("Missing original post or comment text for relevance analysis");
            return Relevance::unknown("Missing original post or comment text");
        }

        let messages = vec![
            ChatMessage::system(
                "You are a comment analysis assistant. You determine if comments are relevant \
                 to the original post and explain your reasoning in JSON format.",
            ),
            ChatMessage::user(format!(
                "Determine if the comment is relevant to the original post and return the result in JSON format.\n\n\
                 ORIGINAL POST:\n{}\n\n\
                 COMMENT:\n{}\n\n\
                 Return a JSON object with exactly these fields:\n\
                 {{\"is_relevant\": \"yes\"|\"somewhat\"|\"no\", \"reasoning\": \"brief 1-2 sentence explanation\"}}",
                post, comment
            )),
        ];

        match self
            .request(&messages, model, self.max_tokens, self.temperature)
            .await
        {
            Ok(content) => {
                let relevance = parse_relevance(&content);
                tracing::info!("Analyzed comment relevance: {}", relevance.verdict);
                relevance
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    model,
                    "Failed to get relevance analysis from LLM gateway"
                );
                Relevance::unknown("Relevance analysis unavailable")
            }
        }
    }
}

fn message_content(v: &Value) -> Option<&Value> {
    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c0| c0.get("message"))
        .and_then(|m| m.get("content"))
}

fn extract_content(v: &Value) -> Result<String, LlmError> {
    // OpenAI-compatible: choices[0].message.content as string
    if let Some(s) = message_content(v).and_then(|c| c.as_str()) {
        return Ok(s.to_string());
    }

    // Some providers return content as array of parts
    if let Some(parts) = message_content(v).and_then(|c| c.as_array()) {
        let mut out = String::new();
        for p in parts {
            if let Some(s) = p.as_str() {
                out.push_str(s);
            } else if let Some(t) = p.get("text").and_then(|t| t.as_str()) {
                out.push_str(t);
            }
        }
        if !out.is_empty() {
            return Ok(out);
        }
    }

    if let Some(err_msg) = detect_provider_error(v) {
        return Err(LlmError::Provider(err_msg));
    }

    Err(LlmError::EmptyResponse(v.to_string()))
}

fn detect_provider_error(value: &Value) -> Option<String> {
    let error_val = value.get("error")?;

    if let Some(obj) = error_val.as_object() {
        let message = ["message", "msg", "detail"]
            .iter()
            .filter_map(|key| obj.get(*key))
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());
        let code = obj.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        return Some(match (code, message) {
            (Some(code), Some(msg)) => format!("{}: {}", code, msg),
            (None, Some(msg)) => msg,
            _ => error_val.to_string(),
        });
    }

    error_val
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
