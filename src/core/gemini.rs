//! `ChatBackend` for the Gemini `generateContent` REST endpoint.
//!
//! The endpoint is stateless, so a session is the replayed conversation held
//! client side and sent in full with every turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, trace};

use crate::api::{
    default_safety_settings, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, SafetySetting,
};
use crate::core::error::{SendError, SessionInitError};
use crate::core::message::{Message, Role};
use crate::core::session::{ChatBackend, ChatSession};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub const DEFAULT_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.9,
    top_k: 1,
    top_p: 1.0,
    max_output_tokens: 2048,
};

/// Finish reasons that mean the candidate was withheld by a content filter.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    generation: GenerationConfig,
    safety: Vec<SafetySetting>,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            generation: DEFAULT_GENERATION,
            safety: default_safety_settings(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<Url, SessionInitError> {
        if self.model.trim().is_empty() {
            return Err(SessionInitError::Misconfigured("no model is set".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(SessionInitError::Misconfigured("no API key is set".into()));
        }
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model.trim()
        );
        Url::parse(&raw).map_err(|err| {
            SessionInitError::Misconfigured(format!("invalid base URL {}: {err}", self.base_url))
        })
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn start_session(
        &self,
        seed: &[Message],
    ) -> Result<Box<dyn ChatSession>, SessionInitError> {
        let endpoint = self.endpoint()?;
        debug!(model = %self.model, seed_len = seed.len(), "starting gemini session");
        Ok(Box::new(GeminiSession {
            backend: self.clone(),
            endpoint,
            contents: seed.iter().map(to_content).collect(),
        }))
    }
}

/// Seed history for one session. Each send posts the seed plus the new
/// turn; the session itself never grows.
pub struct GeminiSession {
    backend: GeminiBackend,
    endpoint: Url,
    contents: Vec<Content>,
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&mut self, text: &str) -> Result<String, SendError> {
        let mut contents = self.contents.clone();
        contents.push(Content::text(Role::User.to_api_role(), text));
        let request = GenerateContentRequest {
            contents,
            generation_config: self.backend.generation,
            safety_settings: self.backend.safety.clone(),
        };

        trace!(turns = request.contents.len(), "posting generateContent");
        let response = self
            .backend
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.backend.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| SendError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SendError::Transport(err.without_url().to_string()))?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        extract_reply(&body)
    }
}

fn to_content(message: &Message) -> Content {
    Content::text(message.role().to_api_role(), message.text())
}

/// Map a non-2xx response to an API error, preferring the structured message.
fn map_http_error(status: StatusCode, body: &str) -> SendError {
    let message = serde_json::from_str::<crate::api::ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let detail = wrapper
                .error
                .message
                .unwrap_or_else(|| body.trim().to_string());
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {detail}"),
                _ => detail,
            }
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    SendError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Pull the reply text out of a successful response body.
fn extract_reply(body: &str) -> Result<String, SendError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| SendError::Malformed(err.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(SendError::SafetyBlocked { reason });
    }

    let Some(candidate) = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
    else {
        return Err(SendError::EmptyResponse);
    };

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
    {
        return Err(SendError::SafetyBlocked {
            reason: reason.to_string(),
        });
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        Err(SendError::EmptyResponse)
    } else {
        Ok(text)
    }
}
