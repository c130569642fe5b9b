//! Provider image records and the caller-facing recommendation

use serde::{Deserialize, Serialize};

/// One image returned by the search provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateImage {
    /// Provider-assigned id, stable across calls
    pub id: u64,
    /// Display-resolution URL
    pub url: String,
    pub preview_url: String,
    pub large_url: String,
    /// Uploader name
    pub user: String,
    /// Comma-delimited free-text keywords
    pub tags: String,
    /// Display-resolution width in pixels
    pub width: u32,
    /// Display-resolution height in pixels
    pub height: u32,
    pub likes: u64,
    pub downloads: u64,
}

impl CandidateImage {
    /// Lowercased tag text for keyword matching
    pub fn tags_lower(&self) -> String {
        self.tags.to_lowercase()
    }
}

/// Image recommendation handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageRecommendation {
    pub id: u64,
    pub url: String,
    pub preview_url: String,
    pub large_url: String,
    /// `"<category> - <tags>"`
    pub alt_text: String,
    pub width: u32,
    pub height: u32,
    pub user: String,
    pub tags: String,
}

impl ImageRecommendation {
    pub fn from_candidate(category: &str, image: CandidateImage) -> Self {
        Self {
            alt_text: format!("{} - {}", category, image.tags),
            id: image.id,
            url: image.url,
            preview_url: image.preview_url,
            large_url: image.large_url,
            width: image.width,
            height: image.height,
            user: image.user,
            tags: image.tags,
        }
    }
}

/// Keyword search request sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub per_page: u32,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, per_page: u32) -> Self {
        Self {
            term: term.into(),
            per_page,
        }
    }
}
