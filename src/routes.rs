use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    extract::parse_first_object,
    groq::{ChatCompletion, ChatRequest, GroqClient},
    huggingface::{to_data_uri, HuggingFaceClient, TextToImage},
    image_source::{ImageChain, ImageQuery, ImageSource, PlaceholderSource, StockPhotoSource},
    models::{
        CaptionPayload, GenerationRequest, GenerationResult, ImageGenerationRequest, ImageGenerationResponse,
        ProxyRequest,
    },
    pexels::PexelsClient,
    proxy,
};

const SEED_RANGE: u32 = 1_000_000;
const QUOTES: &[char] = &['"', '\''];

#[derive(Clone)]
pub struct AppState {
    pub chat: Option<Arc<dyn ChatCompletion>>,
    pub text_to_image: Option<Arc<dyn TextToImage>>,
    pub images: Arc<ImageChain>,
    /// Proxy client has no total timeout so long image bodies can finish streaming.
    pub proxy_http: reqwest::Client,
    pub proxy_header_timeout: Duration,
    pub prompt_image_host: String,
}

impl AppState {
    /// Wires the real upstream adapters. Missing keys leave the matching slot empty.
    pub fn from_config(config: &Config) -> Self {
        let http = config.http_client();

        let chat = config
            .groq_api_key
            .clone()
            .map(|key| Arc::new(GroqClient::new(http.clone(), key, config)) as Arc<dyn ChatCompletion>);
        let text_to_image = config
            .huggingface_api_key
            .clone()
            .map(|key| Arc::new(HuggingFaceClient::new(http.clone(), key, config)) as Arc<dyn TextToImage>);

        let mut tiers: Vec<Arc<dyn ImageSource>> = Vec::new();
        match config.pexels_api_key.clone() {
            Some(key) => {
                let search = Arc::new(PexelsClient::new(http.clone(), key, config));
                tiers.push(Arc::new(StockPhotoSource::new(search)));
            }
            None => warn!("⚠️ PEXELS_API_KEY not configured, images will use the placeholder"),
        }
        let images = ImageChain::new(tiers, PlaceholderSource::new(&config.picsum_base));
        info!("Image tiers: {}", images.tier_names().join(" -> "));

        Self {
            chat,
            text_to_image,
            images: Arc::new(images),
            proxy_http: config.proxy_client(),
            proxy_header_timeout: config.upstream_timeout,
            prompt_image_host: config.pollinations_base.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generate-image", post(generate_image))
        .route("/api/image-proxy", get(image_proxy))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn caption_prompt(idea: &str) -> String {
    format!(
        "Generate a catchy social media caption and 5-10 relevant hashtags for the following idea: \"{idea}\". \
        Return the result strictly in JSON format with keys \"caption\" and \"hashtags\" (as an array of strings)."
    )
}

fn keywords_prompt(idea: &str) -> String {
    format!(
        "For the idea \"{idea}\", provide 1-3 keywords for finding relevant images \
        (e.g., for \"lion\" return \"lion wildlife\", for \"sunset\" return \"sunset ocean\"). \
        Return ONLY the keywords, no quotes or punctuation."
    )
}

/// Interprets the caption model's reply.
pub fn parse_caption(text: &str) -> AppResult<CaptionPayload> {
    match parse_first_object::<CaptionPayload>(text) {
        Some(Ok(mut payload)) => {
            payload.hashtags.retain(|t| !t.trim().is_empty());
            Ok(payload)
        }
        Some(Err(e)) => Err(AppError::UpstreamParse(format!("Invalid JSON in response: {}: {}", e, text))),
        None => Err(AppError::UpstreamParse(format!("No JSON found in response: {}", text))),
    }
}

/// Trims, drops one wrapping quote on each side and lowercases. Blank replies use the idea.
pub fn normalize_keywords(raw: Option<&str>, idea: &str) -> String {
    let clean = |s: &str| {
        let s = s.trim();
        let s = s.strip_prefix(QUOTES).unwrap_or(s);
        let s = s.strip_suffix(QUOTES).unwrap_or(s);
        s.to_lowercase()
    };
    let keywords = raw.map(str::trim).filter(|s| !s.is_empty()).map(clean).unwrap_or_default();
    if keywords.is_empty() {
        clean(idea)
    } else {
        keywords
    }
}

pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> AppResult<Json<GenerationResult>> {
    let chat = state.chat.clone().ok_or(AppError::Config("GROQ_API_KEY"))?;
    let Json(body) = body?;

    let idea = body.idea.trim();
    if idea.is_empty() {
        return Err(AppError::Validation("Idea is required".into()));
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, "📝 Generating content for idea: {}", idea);

    // Independent prompts, so both calls go out together
    let (caption_reply, keywords_reply) = tokio::join!(
        chat.complete(ChatRequest { prompt: caption_prompt(idea), temperature: 0.7, max_tokens: 500 }),
        chat.complete(ChatRequest { prompt: keywords_prompt(idea), temperature: 0.6, max_tokens: 20 }),
    );

    let caption = parse_caption(&caption_reply?)?;
    info!(%request_id, "✅ Caption and {} hashtags generated", caption.hashtags.len());

    let keywords = match keywords_reply {
        Ok(text) => normalize_keywords(Some(&text), idea),
        Err(e) => {
            warn!(%request_id, "⚠️ Keyword derivation failed, using the idea: {}", e);
            normalize_keywords(None, idea)
        }
    };

    let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
    info!(%request_id, "🔍 Searching for images with keywords: {}", keywords);

    let image = state.images.resolve(&ImageQuery { keywords: &keywords, seed }).await;
    info!(%request_id, source = image.source, "🖼️ Image selected: {}", image.url);

    Ok(Json(GenerationResult {
        caption: caption.caption,
        hashtags: caption.hashtags,
        image_url: image.url,
        image_prompt: keywords,
        seed,
    }))
}

/// Errors from the image generation endpoint carry `success: false`.
pub struct ImageGenerationError(AppError);

impl From<AppError> for ImageGenerationError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ImageGenerationError {
    fn into_response(self) -> Response {
        let body = ImageGenerationResponse { success: false, image_url: None, error: Some(self.0.to_string()) };
        (self.0.status(), Json(body)).into_response()
    }
}

pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<ImageGenerationRequest>, JsonRejection>,
) -> Result<Json<ImageGenerationResponse>, ImageGenerationError> {
    let model = state.text_to_image.clone().ok_or_else(|| {
        error!("❌ HUGGINGFACE_API_KEY not found");
        AppError::Config("HUGGINGFACE_API_KEY")
    })?;
    let Json(body) = body.map_err(AppError::from)?;

    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("Prompt is required".into()).into());
    }

    info!("🎨 Generating image with prompt: {}", prompt);
    let image = model.text_to_image(prompt).await.map_err(|e| {
        error!("❌ Image generation error: {}", e);
        AppError::from(e)
    })?;

    let data_uri = to_data_uri(&image);
    info!("✅ Image generated, data URI size: {} KB", data_uri.len() / 1024);

    Ok(Json(ImageGenerationResponse { success: true, image_url: Some(data_uri), error: None }))
}

pub async fn image_proxy(State(state): State<AppState>, Query(params): Query<ProxyRequest>) -> Response {
    let result = match proxy::derive_target(&params, &state.prompt_image_host) {
        Some(target) => proxy::forward(&state.proxy_http, &target, state.proxy_header_timeout).await,
        None => Err(AppError::Validation("Missing parameters".into())),
    };
    // Plain-text errors, the caller is an <img> tag
    result.unwrap_or_else(|e| (e.status(), e.to_string()).into_response())
}
