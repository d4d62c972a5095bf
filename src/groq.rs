use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Config;
use crate::error::ClientError;

/// One single-turn prompt sent to a chat-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the first choice's message text, or an empty string when the model sent none.
    async fn complete(&self, request: ChatRequest) -> Result<String, ClientError>;
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(client: Client, api_key: String, config: &Config) -> Self {
        Self {
            client,
            api_key,
            base_url: config.groq_api_base.trim_end_matches('/').to_string(),
            model: config.groq_model.clone(),
        }
    }
}

#[async_trait]
impl ChatCompletion for GroqClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionBody {
            model: &self.model,
            messages: vec![Message { role: "user", content: &request.prompt }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!("🔗 Chat completion via {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ Chat API error {}: {}", status, error_body);
            return Err(ClientError::Status { status, body: error_body });
        }

        let response_text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| ClientError::Decode(format!("{}: {}", e, response_text)))?;

        Ok(first_choice_text(parsed))
    }
}

fn first_choice_text(resp: ChatCompletionResponse) -> String {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
