//! Language model backend trait and the Gemini implementation.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use paper2notion_core::config::LlmConfig;
use serde_json::{Value, json};

use crate::error::{LlmError, Result};

/// Largest document sent inline with a request.
pub const INLINE_DOCUMENT_LIMIT: usize = 20 * 1024 * 1024;

// ── Request ───────────────────────────────────────────────────────────────────

/// A binary attachment sent alongside the prompt.
#[derive(Debug, Clone)]
pub struct Document {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest<'a> {
    pub prompt: String,
    pub document: Option<&'a Document>,
    /// JSON schema for structured output; `None` asks for free text.
    pub response_schema: Option<Value>,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Raw text of the model's answer (JSON text when a schema was given).
    async fn generate(&self, req: GenerateRequest<'_>) -> Result<String>;
    fn model_id(&self) -> &str;
}

async fn check_response_status(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status >= 400 {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);
        return Err(LlmError::ApiError { status, message });
    }
    Ok(serde_json::from_str(&text)?)
}

// ── Google Gemini ─────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    pub temperature: f64,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self::new(api_key, config.model.clone())
            .with_base_url(&config.base_url)
            .with_temperature(config.temperature)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_body(&self, req: &GenerateRequest<'_>) -> Result<Value> {
        let mut parts = Vec::new();
        if let Some(doc) = req.document {
            if doc.bytes.len() > INLINE_DOCUMENT_LIMIT {
                return Err(LlmError::DocumentTooLarge {
                    size: doc.bytes.len(),
                    limit: INLINE_DOCUMENT_LIMIT,
                });
            }
            parts.push(json!({
                "inlineData": {
                    "mimeType": doc.mime_type,
                    "data": BASE64.encode(&doc.bytes),
                }
            }));
        }
        parts.push(json!({ "text": req.prompt }));

        let mut generation_config = json!({ "temperature": self.temperature });
        if let Some(schema) = &req.response_schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }

        Ok(json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": generation_config,
        }))
    }
}

#[async_trait]
impl LanguageModel for GeminiBackend {
    async fn generate(&self, req: GenerateRequest<'_>) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.request_body(&req)?;

        tracing::debug!(model = %self.model, structured = req.response_schema.is_some(), "gemini request");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;

        let candidate = &json["candidates"][0];
        let text: String = candidate["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate["finishReason"]
                .as_str()
                .or_else(|| json["promptFeedback"]["blockReason"].as_str())
                .unwrap_or("unknown");
            return Err(LlmError::EmptyResponse(reason.to_string()));
        }

        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
