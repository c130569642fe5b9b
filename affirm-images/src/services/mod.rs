//! Image resolution services

use crate::error::ProviderError;
use crate::models::{CandidateImage, SearchQuery};
use async_trait::async_trait;

pub mod image_resolver;
pub mod pixabay_client;
pub mod relevance;
pub mod term_mapper;
pub mod used_image_registry;

pub use image_resolver::ImageResolver;
pub use pixabay_client::PixabayClient;
pub use relevance::RelevanceScorer;
pub use term_mapper::TermMapper;
pub use used_image_registry::{DuplicateStats, UsedImageRegistry, UsedImages};

/// Remote keyword image search
///
/// Implementations apply their own fixed filters (photo type, orientation,
/// safe search, minimum size, popularity order) and return one page of raw
/// results. An empty page is `Ok(vec![])`, never an error.
#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    /// Provider identifier (e.g., "Pixabay")
    fn provider_id(&self) -> &'static str;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateImage>, ProviderError>;
}
