//! Configuration loading and API key resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every key is optional;
//! a missing file means built-in defaults, never a startup failure.
//!
//! Config file location priority:
//! 1. Command-line argument
//! 2. `AFFIRM_CONFIG` environment variable
//! 3. `<config_dir>/affirm/affirm-images.toml`
//!
//! Pixabay API key priority: `PIXABAY_API` → `PIXABAY_API_KEY` →
//! `NEXT_PUBLIC_PIXABAY_API_KEY` → TOML `[pixabay] api_key`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AFFIRM_CONFIG";

/// Environment variables checked for the Pixabay API key, highest priority first
pub const API_KEY_ENV_VARS: [&str; 3] = [
    "PIXABAY_API",
    "PIXABAY_API_KEY",
    "NEXT_PUBLIC_PIXABAY_API_KEY",
];

const DEFAULT_PIXABAY_BASE_URL: &str = "https://pixabay.com/api/";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Replacement category → search term table (optional)
    ///
    /// When absent the table compiled into the binary is used.
    #[serde(default)]
    pub search_terms_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Image provider connection settings
    #[serde(default)]
    pub pixabay: PixabayConfig,

    /// Image resolution tuning parameters
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Pixabay connection settings
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PixabayConfig {
    /// API key (lowest priority source, environment variables win)
    pub api_key: Option<String>,
    /// Search endpoint
    pub base_url: String,
    /// Per-request timeout; expiry is reported as a provider error
    pub timeout_secs: u64,
    /// Client-side request quota
    pub requests_per_minute: u32,
}

impl Default for PixabayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PIXABAY_BASE_URL.to_string(),
            timeout_secs: 10,
            requests_per_minute: 100,
        }
    }
}

// Keep the key out of debug logs
impl fmt::Debug for PixabayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixabayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

/// Image resolution tuning parameters
///
/// Defaults reproduce the empirically tuned values the resolver shipped with.
/// They are exposed so they can be re-tuned against a different provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Registry is cleared once tracked ids + urls exceed this count
    pub reset_threshold: usize,
    /// Page size for the primary term search
    pub primary_page_size: u32,
    /// Page size for each alternative term search
    pub alternative_page_size: u32,
    /// Page size for the corpus-expansion retry
    pub expansion_page_size: u32,
    /// Page size for the last-resort search
    pub fallback_page_size: u32,
    /// Fewer usable candidates than this triggers the expansion retry
    pub min_usable_candidates: usize,
    /// Minimum relevance score a candidate needs to be kept
    pub keep_threshold: i32,
    /// Tags mention the search term's first or second word
    pub topical_weight: i32,
    /// Tags depict a person and the category is not wealth-clustered
    pub person_weight: i32,
    /// Tags do not depict a person and the category is wealth-clustered
    pub object_weight: i32,
    /// Candidate has more than `popularity_min_likes` likes
    pub popularity_weight: i32,
    pub popularity_min_likes: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reset_threshold: 1000,
            primary_page_size: 30,
            alternative_page_size: 20,
            expansion_page_size: 50,
            fallback_page_size: 10,
            min_usable_candidates: 5,
            keep_threshold: 2,
            topical_weight: 2,
            person_weight: 2,
            object_weight: 1,
            popularity_weight: 1,
            popularity_min_likes: 10,
        }
    }
}

impl ResolverConfig {
    /// Reject parameter combinations the resolver cannot work with
    pub fn validate(&self) -> Result<()> {
        let page_sizes = [
            ("primary_page_size", self.primary_page_size),
            ("alternative_page_size", self.alternative_page_size),
            ("expansion_page_size", self.expansion_page_size),
            ("fallback_page_size", self.fallback_page_size),
        ];

        for (name, value) in page_sizes {
            if value == 0 {
                return Err(Error::Config(format!("resolver.{} must be greater than 0", name)));
            }
        }

        if self.reset_threshold == 0 {
            return Err(Error::Config(
                "resolver.reset_threshold must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where a resolved API key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Named environment variable
    Environment(&'static str),
    /// `[pixabay] api_key` in the TOML file
    Toml,
}

impl fmt::Display for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeySource::Environment(var) => write!(f, "environment ({})", var),
            ApiKeySource::Toml => write!(f, "TOML config"),
        }
    }
}

/// API key together with its source
#[derive(Clone)]
pub struct ResolvedApiKey {
    pub key: String,
    pub source: ApiKeySource,
}

impl fmt::Debug for ResolvedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedApiKey")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the config file to load
///
/// Returns None only when no CLI path, no environment override and no
/// platform config directory exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("affirm").join("affirm-images.toml"))
}

/// Load bootstrap configuration
///
/// A missing file logs a warning and yields defaults. An unreadable or
/// malformed file, or invalid resolver parameters, are errors.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    config.resolver.validate()?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Resolve the Pixabay API key from environment and TOML
///
/// Blank values are ignored. If more than one source carries a key a warning
/// is logged and the highest priority source wins.
pub fn resolve_pixabay_api_key(config: &TomlConfig) -> Result<ResolvedApiKey> {
    let mut found: Vec<ResolvedApiKey> = API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|key| is_valid_key(key))
                .map(|key| ResolvedApiKey {
                    key: key.trim().to_string(),
                    source: ApiKeySource::Environment(var),
                })
        })
        .collect();

    if let Some(key) = config.pixabay.api_key.as_ref().filter(|k| is_valid_key(k)) {
        found.push(ResolvedApiKey {
            key: key.trim().to_string(),
            source: ApiKeySource::Toml,
        });
    }

    if found.len() > 1 {
        let sources: Vec<String> = found.iter().map(|k| k.source.to_string()).collect();
        warn!(
            "Pixabay API key found in multiple sources: {}. Using {}.",
            sources.join(", "),
            found[0].source
        );
    }

    match found.into_iter().next() {
        Some(resolved) => {
            info!("Pixabay API key loaded from {}", resolved.source);
            Ok(resolved)
        }
        None => Err(Error::Config(
            "Pixabay API key not configured. Please configure using one of:\n\
             1. Environment: PIXABAY_API=your-key-here\n\
             2. TOML config: ~/.config/affirm/affirm-images.toml ([pixabay] api_key = \"your-key\")\n\
             \n\
             Obtain API key at: https://pixabay.com/api/docs/"
                .to_string(),
        )),
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
