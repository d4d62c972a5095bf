//! Ordered image fallback chain.
//!
//! Each tier is tried in turn and the first URL wins. Tier failures are logged and
//! swallowed. The placeholder tier always answers, so resolution never fails.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::pexels::PhotoSearch;

pub const PLACEHOLDER_SIZE: u32 = 1024;
const STOCK_PAGES: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct ImageQuery<'a> {
    pub keywords: &'a str,
    pub seed: u32,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, query: &ImageQuery<'_>) -> Option<String>;
}

/// First photo of a random result page from the stock-photo search.
pub struct StockPhotoSource {
    search: Arc<dyn PhotoSearch>,
}

impl StockPhotoSource {
    pub fn new(search: Arc<dyn PhotoSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl ImageSource for StockPhotoSource {
    fn name(&self) -> &'static str {
        "stock-photo"
    }

    async fn attempt(&self, query: &ImageQuery<'_>) -> Option<String> {
        let page = rand::thread_rng().gen_range(1..=STOCK_PAGES);
        match self.search.search(query.keywords, page, 1).await {
            Ok(photos) => {
                let Some(photo) = photos.first() else {
                    warn!("⚠️ Stock photo search returned no results for '{}'", query.keywords);
                    return None;
                };
                info!("📷 Stock photo {} matched '{}'", photo.id, query.keywords);
                photo.large_url().map(str::to_string)
            }
            Err(e) => {
                warn!("⚠️ Stock photo search failed: {}", e);
                None
            }
        }
    }
}

/// Seeded placeholder image; never fails.
pub struct PlaceholderSource {
    base_url: String,
}

impl PlaceholderSource {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn url_for(&self, seed: u32) -> String {
        format!("{}/seed/{}/{}/{}", self.base_url, seed, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)
    }
}

#[async_trait]
impl ImageSource for PlaceholderSource {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn attempt(&self, query: &ImageQuery<'_>) -> Option<String> {
        Some(self.url_for(query.seed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub url: String,
    pub source: &'static str,
}

pub struct ImageChain {
    tiers: Vec<Arc<dyn ImageSource>>,
    fallback: PlaceholderSource,
}

impl ImageChain {
    pub fn new(tiers: Vec<Arc<dyn ImageSource>>, fallback: PlaceholderSource) -> Self {
        Self { tiers, fallback }
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers
            .iter()
            .map(|t| t.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    pub async fn resolve(&self, query: &ImageQuery<'_>) -> ResolvedImage {
        for tier in &self.tiers {
            if let Some(url) = tier.attempt(query).await {
                info!("✅ Image resolved via {}", tier.name());
                return ResolvedImage { url, source: tier.name() };
            }
            info!("🔄 {} yielded nothing, trying next tier", tier.name());
        }
        ResolvedImage { url: self.fallback.url_for(query.seed), source: self.fallback.name() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::pexels::{Photo, PhotoSrc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Outcome {
        Found(&'static str),
        Empty,
        Fails,
    }

    struct FakeSearch {
        outcome: Outcome,
        calls: AtomicUsize,
        pages: Mutex<Vec<u32>>,
    }

    impl FakeSearch {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self { outcome, calls: AtomicUsize::new(0), pages: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl PhotoSearch for FakeSearch {
        async fn search(&self, _query: &str, page: u32, per_page: u32) -> Result<Vec<Photo>, ClientError> {
            assert_eq!(per_page, 1);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.lock().unwrap().push(page);
            match self.outcome {
                Outcome::Found(url) => Ok(vec![Photo {
                    id: 7,
                    src: PhotoSrc { large2x: Some(url.to_string()), ..Default::default() },
                }]),
                Outcome::Empty => Ok(Vec::new()),
                Outcome::Fails => Err(ClientError::Http("connection reset".into())),
            }
        }
    }

    fn chain_with(search: Arc<FakeSearch>) -> ImageChain {
        ImageChain::new(
            vec![Arc::new(StockPhotoSource::new(search)) as Arc<dyn ImageSource>],
            PlaceholderSource::new("https://picsum.photos/"),
        )
    }

    #[test]
    fn placeholder_url_embeds_seed() {
        let source = PlaceholderSource::new("https://picsum.photos");
        assert_eq!(source.url_for(42), "https://picsum.photos/seed/42/1024/1024");
    }

    #[tokio::test]
    async fn stock_hit_wins() {
        let search = FakeSearch::new(Outcome::Found("https://images.example/lion.jpg"));
        let resolved = chain_with(search.clone()).resolve(&ImageQuery { keywords: "lion", seed: 1 }).await;
        assert_eq!(
            resolved,
            ResolvedImage { url: "https://images.example/lion.jpg".into(), source: "stock-photo" }
        );
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        let page = search.pages.lock().unwrap()[0];
        assert!((1..=10).contains(&page));
    }

    #[tokio::test]
    async fn empty_results_fall_through_to_placeholder() {
        let search = FakeSearch::new(Outcome::Empty);
        let resolved = chain_with(search).resolve(&ImageQuery { keywords: "zzz", seed: 99 }).await;
        assert_eq!(resolved.url, "https://picsum.photos/seed/99/1024/1024");
        assert_eq!(resolved.source, "placeholder");
    }

    #[tokio::test]
    async fn search_failure_is_swallowed() {
        let search = FakeSearch::new(Outcome::Fails);
        let resolved = chain_with(search.clone()).resolve(&ImageQuery { keywords: "cat", seed: 5 }).await;
        assert_eq!(resolved.url, "https://picsum.photos/seed/5/1024/1024");
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_tiers_means_placeholder_only() {
        let chain = ImageChain::new(Vec::new(), PlaceholderSource::new("https://picsum.photos"));
        assert_eq!(chain.tier_names(), vec!["placeholder"]);
        let resolved = chain.resolve(&ImageQuery { keywords: "cat", seed: 123456 }).await;
        assert!(resolved.url.contains("/seed/123456/"));
    }
}
