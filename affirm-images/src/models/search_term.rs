//! Search terms derived from category names

use serde::Serialize;
use std::fmt;

/// How a search term was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermSource {
    /// Category name matched a table key exactly
    Exact,
    /// Category name and a table key contain one another
    Partial { matched_key: String },
    /// Built from the category name and generic qualifiers
    Synthesized,
    /// Entry from the alternative-term list
    Alternative,
    /// Generic term used once every other tier failed
    LastResort,
    /// Supplied directly by the caller, not derived from a category
    Caller,
}

impl TermSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermSource::Exact => "exact",
            TermSource::Partial { .. } => "partial",
            TermSource::Synthesized => "synthesized",
            TermSource::Alternative => "alternative",
            TermSource::LastResort => "last-resort",
            TermSource::Caller => "caller",
        }
    }
}

/// Keyword phrase sent to the image provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTerm {
    text: String,
    source: TermSource,
}

impl SearchTerm {
    pub fn new(text: impl Into<String>, source: TermSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Caller-supplied phrase, trimmed
    pub fn caller(text: &str) -> Self {
        Self::new(text.trim(), TermSource::Caller)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &TermSource {
        &self.source
    }

    /// First and second words of the term, lowercased
    ///
    /// A candidate is topically relevant when its tags contain either word.
    pub fn topical_keywords(&self) -> Vec<String> {
        self.text
            .split_whitespace()
            .take(2)
            .map(|w| w.to_lowercase())
            .collect()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Imagery bias for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryClass {
    /// People in emotional or achievement contexts
    Generic,
    /// Objects: luxury property, vehicles, jewelry
    WealthCluster,
}

impl CategoryClass {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryClass::Generic => "generic",
            CategoryClass::WealthCluster => "wealth-cluster",
        }
    }
}

/// Every term a resolution may try, in tier order
#[derive(Debug, Clone, Serialize)]
pub struct TermPlan {
    /// Lowercased, trimmed category name
    pub category: String,
    /// Thematic group of the matched table row; None when synthesized
    pub cluster: Option<String>,
    pub class: CategoryClass,
    pub primary: SearchTerm,
    pub alternatives: Vec<SearchTerm>,
    pub last_resort: SearchTerm,
}
