//! OpenAI-compatible chat-completion provider.
//!
//! Works with OpenAI's API and any compatible endpoint. Each call is one
//! stateless turn: the configured persona as the system message plus the
//! inbound text as the user message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use arbolito_core::{config::OpenAiConfig, error::ArbolitoError, traits::Provider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    persona: String,
}

impl OpenAiProvider {
    /// Create from config values. Returns `None` when no API key is set,
    /// so callers can treat the responder flow as disabled.
    pub fn from_config(config: &OpenAiConfig) -> Option<Self> {
        if config.api_key.is_empty() {
            warn!("openai: no API key configured, auto-reply disabled");
            return None;
        }
        Some(Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            persona: config.persona.clone(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

/// Build the two-message turn: persona system prompt plus the user text.
pub(crate) fn build_messages(persona: &str, user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !persona.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: persona.to_string(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user_text.to_string(),
    });
    messages
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, user_text: &str) -> Result<String, ArbolitoError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(&self.persona, user_text),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("openai: POST {url} model={}", self.model);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ArbolitoError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ArbolitoError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            ArbolitoError::Provider(format!("openai: failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| ArbolitoError::Provider("openai: empty completion".to_string()))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
