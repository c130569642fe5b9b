//! affirm-images - Affirmation category image resolver
//!
//! Operator CLI over the resolver library: resolve categories to images,
//! inspect the search terms a category maps to, and check configuration.

use affirm_common::config::{self, TomlConfig};
use affirm_images::services::TermMapper;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "affirm-images", version, about = "Resolve affirmation categories to stock photos")]
struct Cli {
    /// Configuration file (overrides AFFIRM_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve images for a category, never repeating one within this run
    Resolve {
        category: String,

        /// Number of images to resolve
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Print recommendations as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the search terms a category maps to (no API key needed)
    Terms { category: String },

    /// Report effective configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info until [logging] level is loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let env_overrides = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "affirm-images v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = config::resolve_config_path(cli.config.as_deref());
    let toml_config = match &config_path {
        Some(path) => config::load_toml_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TomlConfig::default(),
    };

    if !env_overrides {
        let level = EnvFilter::try_new(&toml_config.logging.level).with_context(|| {
            format!("Invalid [logging] level '{}'", toml_config.logging.level)
        })?;
        filter_handle.reload(level)?;
    }

    match cli.command {
        Command::Resolve {
            category,
            count,
            json,
        } => resolve(&toml_config, &category, count, json).await,
        Command::Terms { category } => terms(&toml_config, &category),
        Command::CheckConfig => check_config(&toml_config, config_path),
    }
}

async fn resolve(config: &TomlConfig, category: &str, count: u32, json: bool) -> Result<()> {
    let resolver = affirm_images::build_resolver(config)?;
    info!(
        category = %category,
        count,
        reset_threshold = resolver.config().reset_threshold,
        primary_page_size = resolver.config().primary_page_size,
        "Resolving images"
    );

    for _ in 0..count {
        match resolver.recommend(category).await? {
            Some(rec) if json => println!("{}", serde_json::to_string(&rec)?),
            Some(rec) => println!("{}\t{}\t{}", rec.id, rec.url, rec.alt_text),
            None => println!("no suitable image for '{}'", category),
        }
    }

    let stats = resolver.duplicate_prevention_stats().await;
    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "tracked: {} ids, {} urls ({} total)",
            stats.used_ids, stats.used_urls, stats.total
        );
    }

    Ok(())
}

fn terms(config: &TomlConfig, category: &str) -> Result<()> {
    let mapper = TermMapper::load(config.search_terms_path.as_deref())?;
    let plan = mapper.plan(category);

    println!("category:    {}", plan.category);
    println!("cluster:     {}", plan.cluster.as_deref().unwrap_or("(none)"));
    println!("class:       {}", plan.class.as_str());
    println!("primary:     {} ({})", plan.primary, plan.primary.source().as_str());
    for (i, alt) in plan.alternatives.iter().enumerate() {
        println!("alternative: {}. {}", i + 1, alt);
    }
    println!("last resort: {}", plan.last_resort);

    Ok(())
}

fn check_config(config: &TomlConfig, path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) if path.exists() => println!("config file: {}", path.display()),
        Some(path) => println!("config file: {} (not found, using defaults)", path.display()),
        None => println!("config file: none (using defaults)"),
    }

    let api_key = config::resolve_pixabay_api_key(config);
    match &api_key {
        Ok(resolved) => println!("api key:     configured ({})", resolved.source),
        Err(_) => println!("api key:     NOT configured"),
    }

    let terms = TermMapper::load(config.search_terms_path.as_deref())?;
    match &config.search_terms_path {
        Some(path) => println!("terms table: {} ({} categories)", path.display(), terms.len()),
        None => println!("terms table: built-in ({} categories)", terms.len()),
    }

    println!(
        "pixabay:     {} (timeout {}s, {} req/min)",
        config.pixabay.base_url, config.pixabay.timeout_secs, config.pixabay.requests_per_minute
    );
    println!();
    println!("[resolver]");
    print!("{}", toml::to_string_pretty(&config.resolver)?);

    // A missing key still fails the check
    api_key?;
    Ok(())
}
