//! Scripted image provider
//!
//! Answers each search term with a fixed batch and records every query in
//! call order.

#![allow(dead_code)]

use affirm_common::config::ResolverConfig;
use affirm_images::error::ProviderError;
use affirm_images::models::{CandidateImage, SearchQuery};
use affirm_images::services::{ImageResolver, ImageSearchProvider, TermMapper, UsedImageRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct StubProvider {
    batches: HashMap<String, Vec<CandidateImage>>,
    paged: HashMap<(String, u32), Vec<CandidateImage>>,
    failure: Option<ProviderError>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `term` with `images`; unknown terms get an empty page
    pub fn with_batch(mut self, term: &str, images: Vec<CandidateImage>) -> Self {
        self.batches.insert(term.to_string(), images);
        self
    }

    /// Answer `term` at exactly `per_page` with `images`, ahead of `with_batch`
    pub fn with_page(mut self, term: &str, per_page: u32, images: Vec<CandidateImage>) -> Self {
        self.paged.insert((term.to_string(), per_page), images);
        self
    }

    /// Fail every search with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn terms_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(term, _)| term).collect()
    }
}

#[async_trait]
impl ImageSearchProvider for StubProvider {
    fn provider_id(&self) -> &'static str {
        "Stub"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateImage>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.term.clone(), query.per_page));

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let paged = self.paged.get(&(query.term.clone(), query.per_page));
        Ok(paged
            .or_else(|| self.batches.get(&query.term))
            .cloned()
            .unwrap_or_default())
    }
}

/// Candidate with distinct id and URL
pub fn image(id: u64, tags: &str, likes: u64) -> CandidateImage {
    CandidateImage {
        id,
        url: format!("https://cdn.example/photo/{}_640.jpg", id),
        preview_url: format!("https://cdn.example/photo/{}_150.jpg", id),
        large_url: format!("https://cdn.example/photo/{}_1280.jpg", id),
        user: "stub".to_string(),
        tags: tags.to_string(),
        width: 640,
        height: 427,
        likes,
        downloads: 0,
    }
}

/// Resolver over `provider` with the built-in term table and a fresh registry
pub fn resolver_with(provider: Arc<StubProvider>, registry: Arc<UsedImageRegistry>) -> ImageResolver {
    ImageResolver::new(
        provider,
        Arc::new(TermMapper::embedded().unwrap()),
        registry,
        ResolverConfig::default(),
    )
}
