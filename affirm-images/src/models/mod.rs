//! Data models for image resolution

pub mod candidate_image;
pub mod search_term;

pub use candidate_image::{CandidateImage, ImageRecommendation, SearchQuery};
pub use search_term::{CategoryClass, SearchTerm, TermPlan, TermSource};
