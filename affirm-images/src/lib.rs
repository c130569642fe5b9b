//! affirm-images library interface
//!
//! Resolves affirmation category names to stock photographs, never serving
//! the same image twice within one registry lifetime.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ProviderError, ResolveError, ResolveResult};
pub use crate::models::{CandidateImage, ImageRecommendation};
pub use crate::services::{ImageResolver, ImageSearchProvider, UsedImageRegistry};

use affirm_common::config::{resolve_pixabay_api_key, TomlConfig};
use services::{PixabayClient, TermMapper};
use std::sync::Arc;

/// Build a Pixabay-backed resolver from bootstrap configuration
///
/// Fails with `ResolveError::Configuration` before any provider call when
/// the API key is missing, the term table cannot be loaded, or the provider
/// settings are invalid.
pub fn build_resolver(config: &TomlConfig) -> ResolveResult<ImageResolver> {
    let api_key = resolve_pixabay_api_key(config)?;
    let terms = TermMapper::load(config.search_terms_path.as_deref())?;
    let client = PixabayClient::new(api_key.key, &config.pixabay)?;
    let registry = UsedImageRegistry::new(config.resolver.reset_threshold);

    Ok(ImageResolver::new(
        Arc::new(client),
        Arc::new(terms),
        Arc::new(registry),
        config.resolver.clone(),
    ))
}
