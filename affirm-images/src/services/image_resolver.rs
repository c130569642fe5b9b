//! Category → image resolution
//!
//! Resolves a category name to one image not previously served by this
//! resolver's registry, degrading through three tiers:
//! 1. Primary term (exact, partial or synthesized table match)
//! 2. Each alternative phrasing for the category, in table order
//! 3. A generic last-resort term (person-centric, or object-centric for
//!    wealth-clustered categories)
//!
//! Within tiers 1 and 2 every provider batch is relevance-filtered and
//! deduplicated. When fewer than `min_usable_candidates` survive, the same
//! term is re-queried with a larger page. Selection picks uniformly at
//! random and claims the image under the registry lock.
//!
//! Provider failures propagate and are not retried. Exhausting every tier is
//! `Ok(None)`.

use crate::error::ResolveResult;
use crate::models::{
    CandidateImage, CategoryClass, ImageRecommendation, SearchQuery, SearchTerm, TermPlan,
};
use crate::services::relevance::RelevanceScorer;
use crate::services::term_mapper::TermMapper;
use crate::services::used_image_registry::{DuplicateStats, UsedImageRegistry};
use crate::services::ImageSearchProvider;
use affirm_common::config::ResolverConfig;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Duplicate-avoiding image resolver
pub struct ImageResolver {
    provider: Arc<dyn ImageSearchProvider>,
    terms: Arc<TermMapper>,
    registry: Arc<UsedImageRegistry>,
    scorer: RelevanceScorer,
    config: ResolverConfig,
}

impl ImageResolver {
    /// Create a resolver
    ///
    /// The registry is injected so several resolvers (or tests) can share or
    /// isolate duplicate tracking.
    pub fn new(
        provider: Arc<dyn ImageSearchProvider>,
        terms: Arc<TermMapper>,
        registry: Arc<UsedImageRegistry>,
        config: ResolverConfig,
    ) -> Self {
        let scorer = RelevanceScorer::new(&config, terms.person_keywords());
        Self {
            provider,
            terms,
            registry,
            scorer,
            config,
        }
    }

    pub fn terms(&self) -> &TermMapper {
        &self.terms
    }

    pub fn registry(&self) -> &Arc<UsedImageRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `category` to one unused image
    ///
    /// Returns `Ok(None)` when every tier came back empty.
    pub async fn resolve_image_for_category(
        &self,
        category: &str,
    ) -> ResolveResult<Option<CandidateImage>> {
        self.registry.auto_reset_if_needed().await;

        let plan = self.terms.plan(category);

        info!(
            category = %category,
            term = %plan.primary,
            term_source = plan.primary.source().as_str(),
            class = plan.class.as_str(),
            provider = self.provider.provider_id(),
            "Resolving image for category"
        );

        if let Some(image) = self
            .resolve_tier(&plan.primary, plan.class, self.config.primary_page_size)
            .await?
        {
            return Ok(Some(image));
        }

        for term in &plan.alternatives {
            debug!(category = %category, term = %term, "Trying alternative term");

            if let Some(image) = self
                .resolve_tier(term, plan.class, self.config.alternative_page_size)
                .await?
            {
                info!(
                    category = %category,
                    term = %term,
                    image_id = image.id,
                    "Resolved image with alternative term"
                );
                return Ok(Some(image));
            }
        }

        self.resolve_last_resort(&plan).await
    }

    /// Resolve `category` into the caller-facing recommendation
    pub async fn recommend(&self, category: &str) -> ResolveResult<Option<ImageRecommendation>> {
        let image = self.resolve_image_for_category(category).await?;
        Ok(image.map(|image| ImageRecommendation::from_candidate(category.trim(), image)))
    }

    /// One relevance-filtered, deduplicated batch for `term`
    ///
    /// Nothing is marked used. The term itself decides the imagery bias.
    pub async fn search_images(
        &self,
        term: &str,
        per_page: u32,
    ) -> ResolveResult<Vec<CandidateImage>> {
        let class = self.terms.classify_category(term);
        let term = SearchTerm::caller(term);
        debug!(
            term = %term,
            term_source = term.source().as_str(),
            per_page,
            "Filtered search"
        );
        let batch = self
            .provider
            .search(&SearchQuery::new(term.as_str(), per_page))
            .await?;

        let usable: Vec<CandidateImage> = self
            .registry
            .with_lock(|used| {
                self.scorer
                    .filter_batch(&batch, used, &term, class)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await;

        Ok(usable)
    }

    pub async fn duplicate_prevention_stats(&self) -> DuplicateStats {
        self.registry.stats().await
    }

    pub async fn clear_duplicate_tracking(&self) {
        self.registry.clear().await;
    }

    pub async fn is_duplicate(&self, image: &CandidateImage) -> bool {
        self.registry.is_duplicate(image).await
    }

    /// Search, filter, optionally expand, then claim one image
    async fn resolve_tier(
        &self,
        term: &SearchTerm,
        class: CategoryClass,
        page_size: u32,
    ) -> ResolveResult<Option<CandidateImage>> {
        let mut batch = self
            .provider
            .search(&SearchQuery::new(term.as_str(), page_size))
            .await?;

        if batch.is_empty() {
            debug!(term = %term, "Provider returned no results");
            return Ok(None);
        }

        let usable = self
            .registry
            .with_lock(|used| self.scorer.filter_batch(&batch, used, term, class).len())
            .await;

        if usable < self.config.min_usable_candidates {
            debug!(
                term = %term,
                usable,
                expansion_page_size = self.config.expansion_page_size,
                "Few unique images available, expanding search"
            );

            let expanded = self
                .provider
                .search(&SearchQuery::new(term.as_str(), self.config.expansion_page_size))
                .await?;

            if expanded.len() > batch.len() {
                debug!(term = %term, results = expanded.len(), "Expanded search found more images");
                batch = expanded;
            }
        }

        // Filter again under the same lock that claims: the registry may have
        // changed while the provider call was in flight
        let selected = self
            .registry
            .with_lock(|used| {
                let working = self.scorer.filter_batch(&batch, used, term, class);
                if working.is_empty() {
                    return None;
                }

                let index = rand::thread_rng().gen_range(0..working.len());
                let chosen = working[index].clone();
                used.mark(&chosen);
                Some((chosen, index, working.len()))
            })
            .await;

        match selected {
            Some((image, index, available)) => {
                info!(
                    term = %term,
                    image_id = image.id,
                    pick = index + 1,
                    available,
                    "Selected image"
                );
                Ok(Some(image))
            }
            None => {
                debug!(term = %term, "Every result already used");
                Ok(None)
            }
        }
    }

    /// Final tier: first result of the generic term, no relevance filtering
    ///
    /// Prefers the first unused result. When every result has been served
    /// before, repeats the first one rather than returning nothing.
    async fn resolve_last_resort(&self, plan: &TermPlan) -> ResolveResult<Option<CandidateImage>> {
        warn!(
            category = %plan.category,
            term = %plan.last_resort,
            "All category terms exhausted, trying fallback search"
        );

        let batch = self
            .provider
            .search(&SearchQuery::new(
                plan.last_resort.as_str(),
                self.config.fallback_page_size,
            ))
            .await?;

        let selected = self
            .registry
            .with_lock(|used| {
                let unused = batch.iter().find(|c| !used.contains(c));
                let chosen = unused.or_else(|| batch.first())?.clone();

                if !used.mark(&chosen) {
                    warn!(
                        category = %plan.category,
                        image_id = chosen.id,
                        "Fallback results exhausted, repeating a previously served image"
                    );
                }
                Some(chosen)
            })
            .await;

        if selected.is_none() {
            info!(category = %plan.category, "No suitable image found");
        }

        Ok(selected)
    }
}
