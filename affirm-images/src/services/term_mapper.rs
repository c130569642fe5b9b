//! Category → search term mapping
//!
//! Maps free-text category names to provider search phrases using an ordered
//! table (see `data/search_terms.toml`). Match strategies, first hit wins:
//! 1. Exact key lookup
//! 2. Bidirectional substring scan over keys, in table order
//! 3. Synthesized phrase from the category name and generic qualifiers
//!
//! The table ships compiled in and can be replaced at runtime from a file.

use crate::models::{CategoryClass, SearchTerm, TermPlan, TermSource};
use affirm_common::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const EMBEDDED_TABLE: &str = include_str!("../../data/search_terms.toml");
const CATEGORY_PLACEHOLDER: &str = "{category}";

#[derive(Debug, Deserialize)]
struct TermTableFile {
    classification: Classification,
    fallback: FallbackTerms,
    synthesized: SynthesizedTemplates,
    #[serde(rename = "category", default)]
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    wealth_keywords: Vec<String>,
    person_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FallbackTerms {
    generic: String,
    wealth: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SynthesizedTemplates {
    primary: String,
    alternatives: Vec<String>,
}

/// One row of the category table
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    /// Thematic grouping (informational)
    pub cluster: String,
    pub term: String,
    pub alternatives: Vec<String>,
}

/// Category table with its lookup strategies
#[derive(Debug, Clone)]
pub struct TermMapper {
    entries: Vec<CategoryEntry>,
    index: HashMap<String, usize>,
    wealth_keywords: Vec<String>,
    person_keywords: Vec<String>,
    fallback: FallbackTerms,
    synthesized: SynthesizedTemplates,
}

impl TermMapper {
    /// Table compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_TABLE)
    }

    /// Replacement table from `path`, or the embedded one when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mapper = Self::from_toml_str(&content)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            categories = mapper.len(),
            "Loaded search term table"
        );

        Ok(mapper)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TermTableFile = toml::from_str(content)
            .map_err(|e| Error::InvalidInput(format!("Search term table parse failed: {}", e)))?;

        let mut entries = Vec::with_capacity(file.categories.len());
        let mut index = HashMap::with_capacity(file.categories.len());

        for mut entry in file.categories {
            entry.key = normalize(&entry.key);

            if entry.key.is_empty() {
                return Err(Error::InvalidInput(
                    "Search term table has an entry with an empty key".to_string(),
                ));
            }
            if entry.term.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Category '{}' has an empty search term",
                    entry.key
                )));
            }
            if entry.alternatives.iter().all(|a| a.trim().is_empty()) {
                return Err(Error::InvalidInput(format!(
                    "Category '{}' has no alternative terms",
                    entry.key
                )));
            }
            if index.insert(entry.key.clone(), entries.len()).is_some() {
                return Err(Error::InvalidInput(format!(
                    "Category '{}' appears more than once",
                    entry.key
                )));
            }

            entries.push(entry);
        }

        if file.fallback.generic.trim().is_empty() || file.fallback.wealth.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Search term table fallback terms must not be empty".to_string(),
            ));
        }

        Ok(Self {
            entries,
            index,
            wealth_keywords: lowercase_all(file.classification.wealth_keywords),
            person_keywords: lowercase_all(file.classification.person_keywords),
            fallback: file.fallback,
            synthesized: file.synthesized,
        })
    }

    /// Number of categories in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Tag words meaning "depicts a person"
    pub fn person_keywords(&self) -> &[String] {
        &self.person_keywords
    }

    /// Object-biased or person-biased imagery for `category`
    pub fn classify_category(&self, category: &str) -> CategoryClass {
        let normalized = normalize(category);
        if self
            .wealth_keywords
            .iter()
            .any(|k| normalized.contains(k.as_str()))
        {
            CategoryClass::WealthCluster
        } else {
            CategoryClass::Generic
        }
    }

    /// Primary search term for `category`
    pub fn primary_term(&self, category: &str) -> SearchTerm {
        let normalized = normalize(category);
        match self.lookup(&normalized) {
            Some((entry, source)) => SearchTerm::new(entry.term.clone(), source),
            None => SearchTerm::new(
                fill_template(&self.synthesized.primary, &normalized),
                TermSource::Synthesized,
            ),
        }
    }

    /// Alternative phrasings tried when the primary term finds nothing
    pub fn alternative_terms(&self, category: &str) -> Vec<SearchTerm> {
        let normalized = normalize(category);
        match self.lookup(&normalized) {
            Some((entry, _)) => entry
                .alternatives
                .iter()
                .filter(|a| !a.trim().is_empty())
                .map(|a| SearchTerm::new(a.clone(), TermSource::Alternative))
                .collect(),
            None => self
                .synthesized
                .alternatives
                .iter()
                .map(|t| SearchTerm::new(fill_template(t, &normalized), TermSource::Alternative))
                .collect(),
        }
    }

    /// Generic term for the final tier
    pub fn last_resort_term(&self, class: CategoryClass) -> SearchTerm {
        let text = match class {
            CategoryClass::Generic => &self.fallback.generic,
            CategoryClass::WealthCluster => &self.fallback.wealth,
        };
        SearchTerm::new(text.clone(), TermSource::LastResort)
    }

    /// Every term a resolution of `category` may try, in tier order
    pub fn plan(&self, category: &str) -> TermPlan {
        let class = self.classify_category(category);
        let normalized = normalize(category);
        let cluster = self
            .lookup(&normalized)
            .map(|(entry, _)| entry.cluster.clone());
        TermPlan {
            category: normalized,
            cluster,
            class,
            primary: self.primary_term(category),
            alternatives: self.alternative_terms(category),
            last_resort: self.last_resort_term(class),
        }
    }

    fn lookup(&self, normalized: &str) -> Option<(&CategoryEntry, TermSource)> {
        if let Some(&i) = self.index.get(normalized) {
            return Some((&self.entries[i], TermSource::Exact));
        }

        // An empty name would match every key
        if normalized.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|e| normalized.contains(e.key.as_str()) || e.key.contains(normalized))
            .map(|e| {
                tracing::debug!(category = %normalized, matched_key = %e.key, "Partial category match");
                (
                    e,
                    TermSource::Partial {
                        matched_key: e.key.clone(),
                    },
                )
            })
    }
}

/// Lowercase and trim a category name
pub fn normalize(category: &str) -> String {
    category.trim().to_lowercase()
}

fn fill_template(template: &str, category: &str) -> String {
    template
        .replace(CATEGORY_PLACEHOLDER, category)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn lowercase_all(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| normalize(&w))
        .filter(|w| !w.is_empty())
        .collect()
}
