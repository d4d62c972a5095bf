//! Byte-transparent image proxy.
//!
//! The prompt host rejects non-browser agents, so every upstream request carries a desktop
//! browser User-Agent. Prompt URLs deliberately carry no `seed` parameter: the host answered
//! seeded requests with 502s when this was last checked. Revalidate before adding one.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::error::AppError;
use crate::models::ProxyRequest;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
pub const PROMPT_IMAGE_SIZE: u32 = 1024;

/// Picks the upstream URL: an explicit `url` wins, otherwise `prompt` is rendered against
/// the prompt-image host. Empty parameters count as absent.
pub fn derive_target(params: &ProxyRequest, prompt_host: &str) -> Option<String> {
    if let Some(url) = params.url.as_deref().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }
    params
        .prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|prompt| prompt_image_url(prompt_host, prompt))
}

pub fn prompt_image_url(host: &str, prompt: &str) -> String {
    format!(
        "{}/prompt/{}?width={}&height={}",
        host.trim_end_matches('/'),
        url_escape::encode_component(prompt),
        PROMPT_IMAGE_SIZE,
        PROMPT_IMAGE_SIZE
    )
}

/// Fetches `target` and streams its body back unmodified.
///
/// `header_timeout` bounds the wait for the upstream status line and headers only.
pub async fn forward(client: &Client, target: &str, header_timeout: Duration) -> Result<Response, AppError> {
    info!("🔗 Proxying request to: {}", target);

    let request = client
        .get(target)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send();

    let upstream = tokio::time::timeout(header_timeout, request)
        .await
        .map_err(|_| {
            error!("❌ Proxy upstream sent no headers within {:?}", header_timeout);
            AppError::Upstream(format!("Failed to fetch image: no response within {:?}", header_timeout))
        })?
        .map_err(|e| {
            error!("❌ Proxy request failed: {}", e);
            AppError::Upstream(format!("Failed to fetch image: {}", e))
        })?;

    let status = upstream.status();
    if !status.is_success() {
        error!("❌ Proxy upstream error: {}", status);
        return Err(AppError::Upstream(format!("Failed to fetch image: {}", status)));
    }

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HOST: &str = "https://image.pollinations.ai";

    fn params(url: Option<&str>, prompt: Option<&str>) -> ProxyRequest {
        ProxyRequest { url: url.map(String::from), prompt: prompt.map(String::from) }
    }

    #[test]
    fn url_is_used_verbatim() {
        let target = derive_target(&params(Some("https://example.com/x.jpg?a=1&b=2"), Some("ignored")), HOST);
        assert_eq!(target.as_deref(), Some("https://example.com/x.jpg?a=1&b=2"));
    }

    #[test]
    fn prompt_builds_fixed_template_without_seed() {
        let target = derive_target(&params(None, Some("cat")), HOST).unwrap();
        assert_eq!(target, "https://image.pollinations.ai/prompt/cat?width=1024&height=1024");
        assert!(!target.contains("seed"));
    }

    #[test]
    fn prompt_is_percent_encoded() {
        let target = derive_target(&params(None, Some("futuristic eye & sky/2?")), HOST).unwrap();
        assert_eq!(
            target,
            "https://image.pollinations.ai/prompt/futuristic%20eye%20%26%20sky%2F2%3F?width=1024&height=1024"
        );
    }

    #[test]
    fn empty_url_falls_back_to_prompt() {
        let target = derive_target(&params(Some(""), Some("dog")), HOST);
        assert_eq!(target.as_deref(), Some("https://image.pollinations.ai/prompt/dog?width=1024&height=1024"));
    }

    #[test]
    fn nothing_to_proxy() {
        assert_eq!(derive_target(&params(None, None), HOST), None);
        assert_eq!(derive_target(&params(Some(""), Some("")), HOST), None);
    }

    #[test]
    fn trailing_slash_on_host_is_tolerated() {
        assert_eq!(prompt_image_url("http://localhost:9000/", "x"), "http://localhost:9000/prompt/x?width=1024&height=1024");
    }
}
