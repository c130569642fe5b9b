//! Pixabay API client
//!
//! Keyword photo search with client-side quota enforcement. Requests carry
//! fixed filters: photos only, horizontal, safe search, at least 800×600,
//! most popular first.

use crate::error::{ProviderError, ResolveError};
use crate::models::{CandidateImage, SearchQuery};
use crate::services::ImageSearchProvider;
use affirm_common::config::PixabayConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

const USER_AGENT: &str = concat!("affirm-images/", env!("CARGO_PKG_VERSION"));

/// Page size range the API accepts
const MIN_PER_PAGE: u32 = 3;
const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(rename = "totalHits", default)]
    total_hits: u64,
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    id: u64,
    #[serde(rename = "webformatURL")]
    webformat_url: String,
    #[serde(rename = "previewURL", default)]
    preview_url: String,
    #[serde(rename = "largeImageURL", default)]
    large_image_url: String,
    #[serde(rename = "webformatWidth", default)]
    webformat_width: u32,
    #[serde(rename = "webformatHeight", default)]
    webformat_height: u32,
    #[serde(default)]
    user: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    downloads: u64,
}

impl From<PixabayHit> for CandidateImage {
    fn from(hit: PixabayHit) -> Self {
        Self {
            id: hit.id,
            url: hit.webformat_url,
            preview_url: hit.preview_url,
            large_url: hit.large_image_url,
            user: hit.user,
            tags: hit.tags,
            width: hit.webformat_width,
            height: hit.webformat_height,
            likes: hit.likes,
            downloads: hit.downloads,
        }
    }
}

/// Pixabay API client
pub struct PixabayClient {
    http_client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl PixabayClient {
    pub fn new(api_key: impl Into<String>, config: &PixabayConfig) -> Result<Self, ResolveError> {
        let per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            ResolveError::Configuration("pixabay.requests_per_minute must be greater than 0".to_string())
        })?;
        if config.timeout_secs == 0 {
            return Err(ResolveError::Configuration(
                "pixabay.timeout_secs must be greater than 0".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: governor::RateLimiter::direct(governor::Quota::per_minute(per_minute)),
            api_key: api_key.into(),
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Query string for `query`, API key included
    fn query_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.api_key.clone()),
            ("q", query.term.clone()),
            ("image_type", "photo".to_string()),
            ("orientation", "horizontal".to_string()),
            ("safesearch", "true".to_string()),
            ("per_page", clamp_per_page(query.per_page).to_string()),
            ("min_width", "800".to_string()),
            ("min_height", "600".to_string()),
            ("order", "popular".to_string()),
        ]
    }
}

/// Clamp a requested page size into the range the API accepts
pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE)
}

#[async_trait]
impl ImageSearchProvider for PixabayClient {
    fn provider_id(&self) -> &'static str {
        "Pixabay"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateImage>, ProviderError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(term = %query.term, per_page = query.per_page, "Querying Pixabay API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let key_rejected = matches!(status.as_u16(), 400 | 401 | 403)
                && error_text.to_lowercase().contains("api key");
            if key_rejected {
                return Err(ProviderError::InvalidApiKey);
            }
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let body: PixabayResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::Parse(e.to_string())
            }
        })?;

        tracing::debug!(
            term = %query.term,
            hits = body.hits.len(),
            total_hits = body.total_hits,
            "Pixabay search returned"
        );

        Ok(body.hits.into_iter().map(CandidateImage::from).collect())
    }
}
