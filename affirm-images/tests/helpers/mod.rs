//! Test Helper Utilities
//!
//! Shared utilities for testing affirm-images

#![allow(unused_imports)]

pub mod mock_pixabay;
pub mod stub_provider;

pub use mock_pixabay::{MockPixabay, Reply};
pub use stub_provider::{image, resolver_with, StubProvider};
