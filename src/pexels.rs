use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::Config;
use crate::error::ClientError;

#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Photo>, ClientError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub id: u64,
    pub src: PhotoSrc,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PhotoSrc {
    #[serde(default)]
    pub large2x: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

impl Photo {
    /// Largest web-sized rendition the search returned.
    pub fn large_url(&self) -> Option<&str> {
        self.src
            .large2x
            .as_deref()
            .or(self.src.large.as_deref())
            .filter(|u| !u.is_empty())
    }
}

pub struct PexelsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PexelsClient {
    pub fn new(client: Client, api_key: String, config: &Config) -> Self {
        Self {
            client,
            api_key,
            base_url: config.pexels_api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PhotoSearch for PexelsClient {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Photo>, ClientError> {
        let url = format!("{}/search", self.base_url);
        info!("🔍 Stock photo search: '{}' page {}", query, page);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .query(&[
                ("query", query.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ Stock photo search error {}: {}", status, error_body);
            return Err(ClientError::Status { status, body: error_body });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.photos)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}
