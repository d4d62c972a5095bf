use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::error::ClientError;

pub const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted, ugly";
pub const INFERENCE_STEPS: u32 = 20;

#[async_trait]
pub trait TextToImage: Send + Sync {
    /// Raw encoded image bytes for `prompt`.
    async fn text_to_image(&self, prompt: &str) -> Result<Bytes, ClientError>;
}

pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HuggingFaceClient {
    pub fn new(client: Client, api_key: String, config: &Config) -> Self {
        Self {
            client,
            api_key,
            base_url: config.huggingface_api_base.trim_end_matches('/').to_string(),
            model: config.huggingface_model.clone(),
        }
    }
}

#[async_trait]
impl TextToImage for HuggingFaceClient {
    async fn text_to_image(&self, prompt: &str) -> Result<Bytes, ClientError> {
        let url = format!("{}/{}", self.base_url, self.model);
        let body = TextToImageBody {
            inputs: prompt,
            parameters: Parameters {
                negative_prompt: NEGATIVE_PROMPT,
                num_inference_steps: INFERENCE_STEPS,
            },
        };

        info!("🔗 Text-to-image request to model {}", self.model);

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
            error!("❌ Text-to-image error {}: {}", status, error_body);
            return Err(ClientError::Status { status, body: error_body });
        }

        Ok(response.bytes().await?)
    }
}

#[derive(Debug, Serialize)]
struct TextToImageBody<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Parameters {
    negative_prompt: &'static str,
    num_inference_steps: u32,
}

/// Embeds image bytes as a PNG data URI.
pub fn to_data_uri(image: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    format!("data:image/png;base64,{}", encoded)
}
