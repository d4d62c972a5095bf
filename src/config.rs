use std::env;
use std::time::Duration;

pub const DEFAULT_GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_HUGGINGFACE_MODEL: &str = "stabilityai/stable-diffusion-2-1";
pub const DEFAULT_PEXELS_API_BASE: &str = "https://api.pexels.com/v1";
pub const DEFAULT_POLLINATIONS_BASE: &str = "https://image.pollinations.ai";
pub const DEFAULT_PICSUM_BASE: &str = "https://picsum.photos";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8080;

/// Process-wide settings, read once at startup and handed to every adapter.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub groq_api_key: Option<String>,
    pub groq_api_base: String,
    pub groq_model: String,
    pub huggingface_api_key: Option<String>,
    pub huggingface_api_base: String,
    pub huggingface_model: String,
    /// Optional. Without it the stock-photo tier is left out of the image chain.
    pub pexels_api_key: Option<String>,
    pub pexels_api_base: String,
    pub pollinations_base: String,
    pub picsum_base: String,
    pub upstream_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            groq_api_key: None,
            groq_api_base: DEFAULT_GROQ_API_BASE.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            huggingface_api_key: None,
            huggingface_api_base: DEFAULT_HUGGINGFACE_API_BASE.to_string(),
            huggingface_model: DEFAULT_HUGGINGFACE_MODEL.to_string(),
            pexels_api_key: None,
            pexels_api_base: DEFAULT_PEXELS_API_BASE.to_string(),
            pollinations_base: DEFAULT_POLLINATIONS_BASE.to_string(),
            picsum_base: DEFAULT_PICSUM_BASE.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            port: get("PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
            groq_api_key: get("GROQ_API_KEY"),
            groq_api_base: get("GROQ_API_BASE").unwrap_or(defaults.groq_api_base),
            groq_model: get("GROQ_MODEL").unwrap_or(defaults.groq_model),
            huggingface_api_key: get("HUGGINGFACE_API_KEY"),
            huggingface_api_base: get("HUGGINGFACE_API_BASE").unwrap_or(defaults.huggingface_api_base),
            huggingface_model: get("HUGGINGFACE_MODEL").unwrap_or(defaults.huggingface_model),
            pexels_api_key: get("PEXELS_API_KEY"),
            pexels_api_base: get("PEXELS_API_BASE").unwrap_or(defaults.pexels_api_base),
            pollinations_base: get("POLLINATIONS_BASE").unwrap_or(defaults.pollinations_base),
            picsum_base: get("PICSUM_BASE").unwrap_or(defaults.picsum_base),
            upstream_timeout: get("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout),
        }
    }

    /// Shared outbound client with the upstream timeout applied.
    pub fn http_client(&self) -> reqwest::Client {
        build_client(reqwest::Client::builder().timeout(self.upstream_timeout))
    }

    /// Client for the image proxy. Only connecting is bounded here; the proxy bounds the
    /// wait for response headers itself and leaves the body stream unbounded.
    pub fn proxy_client(&self) -> reqwest::Client {
        build_client(reqwest::Client::builder().connect_timeout(self.upstream_timeout))
    }
}

fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("⚠️ Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.groq_api_key.is_none());
        assert!(config.pexels_api_key.is_none());
        assert_eq!(config.groq_model, DEFAULT_GROQ_MODEL);
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let config = Config::from_lookup(lookup(&[("GROQ_API_KEY", "  "), ("PEXELS_API_KEY", "")]));
        assert!(config.groq_api_key.is_none());
        assert!(config.pexels_api_key.is_none());
    }

    #[test]
    fn reads_keys_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk_123"),
            ("PORT", "3000"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("POLLINATIONS_BASE", "http://localhost:9000"),
        ]));
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk_123"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.pollinations_base, "http://localhost:9000");
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = Config::from_lookup(lookup(&[("PORT", "eighty"), ("UPSTREAM_TIMEOUT_SECS", "-1")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_timeout, Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS));
    }
}
