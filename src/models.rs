use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GenerationRequest {
    #[serde(default)]
    pub idea: String,
}

/// What the caption model is asked to return.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaptionPayload {
    pub caption: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub caption: String,
    pub hashtags: Vec<String>, // '#' prefix is left to the consumer
    pub image_url: String,
    pub image_prompt: String,
    pub seed: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProxyRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
