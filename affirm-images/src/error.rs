//! Error types for affirm-images
//!
//! "No suitable image" is not an error: resolution returns `Ok(None)` so
//! callers can tell an empty result from a configuration problem or an outage.

use thiserror::Error;

/// Image search provider errors
///
/// Never retried inside this crate; a single failure surfaces to the caller.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Image resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Missing or unusable configuration (operator must fix)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider unreachable or returned a failure status (retry later)
    #[error("Image provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<affirm_common::Error> for ResolveError {
    fn from(err: affirm_common::Error) -> Self {
        ResolveError::Configuration(err.to_string())
    }
}

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;
