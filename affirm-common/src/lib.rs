//! # Affirm Common Library
//!
//! Shared code for the affirmation content services:
//! - Common error and result types
//! - TOML bootstrap configuration loading
//! - Pixabay API key resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
