//! Relevance scoring for provider results
//!
//! Score per candidate (default weights):
//! - +2 tags mention the search term's first or second word
//! - +2 tags depict a person and the category is not wealth-clustered
//! - +1 tags do not depict a person and the category is wealth-clustered
//! - +1 more than 10 likes
//!
//! Candidates below the keep threshold (2) are dropped. Already-used images
//! are always dropped.

use crate::models::{CandidateImage, CategoryClass, SearchTerm};
use crate::services::used_image_registry::UsedImages;
use affirm_common::config::ResolverConfig;

/// Scores and filters candidate batches
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    topical_weight: i32,
    person_weight: i32,
    object_weight: i32,
    popularity_weight: i32,
    popularity_min_likes: u64,
    keep_threshold: i32,
    person_keywords: Vec<String>,
}

impl RelevanceScorer {
    pub fn new(config: &ResolverConfig, person_keywords: &[String]) -> Self {
        Self {
            topical_weight: config.topical_weight,
            person_weight: config.person_weight,
            object_weight: config.object_weight,
            popularity_weight: config.popularity_weight,
            popularity_min_likes: config.popularity_min_likes,
            keep_threshold: config.keep_threshold,
            person_keywords: person_keywords.to_vec(),
        }
    }

    /// `tags_lower` must already be lowercased
    fn tags_depict_person(&self, tags_lower: &str) -> bool {
        self.person_keywords.iter().any(|k| tags_lower.contains(k.as_str()))
    }

    pub fn score(&self, image: &CandidateImage, term: &SearchTerm, class: CategoryClass) -> i32 {
        self.score_with_keywords(image, &term.topical_keywords(), class)
    }

    fn score_with_keywords(
        &self,
        image: &CandidateImage,
        topical_keywords: &[String],
        class: CategoryClass,
    ) -> i32 {
        let tags = image.tags_lower();
        let topical = topical_keywords.iter().any(|k| tags.contains(k.as_str()));
        let person = self.tags_depict_person(&tags);

        let mut score = 0;
        if topical {
            score += self.topical_weight;
        }
        match (class, person) {
            (CategoryClass::Generic, true) => score += self.person_weight,
            (CategoryClass::WealthCluster, false) => score += self.object_weight,
            _ => {}
        }
        if image.likes > self.popularity_min_likes {
            score += self.popularity_weight;
        }
        score
    }

    /// Usable candidates from one provider batch
    ///
    /// Unused candidates scoring at or above the keep threshold. If none
    /// qualify, every unused candidate in the batch.
    pub fn filter_batch<'a>(
        &self,
        batch: &'a [CandidateImage],
        used: &UsedImages,
        term: &SearchTerm,
        class: CategoryClass,
    ) -> Vec<&'a CandidateImage> {
        let keywords = term.topical_keywords();
        let unused: Vec<&CandidateImage> = batch.iter().filter(|c| !used.contains(c)).collect();

        let relevant: Vec<&CandidateImage> = unused
            .iter()
            .copied()
            .filter(|c| self.score_with_keywords(c, &keywords, class) >= self.keep_threshold)
            .collect();

        if relevant.is_empty() && !unused.is_empty() {
            tracing::warn!(
                term = %term,
                unused = unused.len(),
                "No candidate passed relevance filtering, using unfiltered batch"
            );
            return unused;
        }

        relevant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TermSource;

    fn scorer() -> RelevanceScorer {
        let keywords: Vec<String> = ["person", "people", "face", "portrait"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        RelevanceScorer::new(&ResolverConfig::default(), &keywords)
    }

    fn image(id: u64, tags: &str, likes: u64) -> CandidateImage {
        CandidateImage {
            id,
            url: format!("https://cdn.example/{}.jpg", id),
            preview_url: String::new(),
            large_url: String::new(),
            user: String::new(),
            tags: tags.to_string(),
            width: 640,
            height: 480,
            likes,
            downloads: 0,
        }
    }

    fn term(text: &str) -> SearchTerm {
        SearchTerm::new(text, TermSource::Exact)
    }

    #[test]
    fn test_generic_scoring() {
        let scorer = scorer();
        let t = term("achievement success goal reaching");

        assert_eq!(scorer.score(&image(1, "achievement, goal, person", 11), &t, CategoryClass::Generic), 5);
        assert_eq!(scorer.score(&image(2, "flowers", 11), &t, CategoryClass::Generic), 1);
        assert_eq!(scorer.score(&image(3, "Success, Person", 3), &t, CategoryClass::Generic), 4);
        // "goal" is the third word, not topical
        assert_eq!(scorer.score(&image(4, "goal", 3), &t, CategoryClass::Generic), 0);
    }

    #[test]
    fn test_wealth_scoring_prefers_objects() {
        let scorer = scorer();
        let t = term("luxury mansion wealth lifestyle yacht jewelry");

        assert_eq!(scorer.score(&image(1, "mansion, pool", 20), &t, CategoryClass::WealthCluster), 4);
        assert_eq!(scorer.score(&image(2, "mansion, people", 20), &t, CategoryClass::WealthCluster), 3);
        assert_eq!(scorer.score(&image(3, "yacht, sea", 0), &t, CategoryClass::WealthCluster), 1);
    }

    #[test]
    fn test_mixed_case_tags_score_like_lowercase() {
        let scorer = scorer();
        let t = term("Achievement success goal reaching");
        let lower = image(1, "achievement, person", 20);
        let mixed = image(2, "ACHIEVEMENT, Person", 20);

        assert!(scorer.tags_depict_person(&mixed.tags_lower()));
        assert_eq!(
            scorer.score(&mixed, &t, CategoryClass::Generic),
            scorer.score(&lower, &t, CategoryClass::Generic)
        );
        assert_eq!(scorer.score(&mixed, &t, CategoryClass::Generic), 5);
    }

    #[test]
    fn test_likes_must_exceed_minimum() {
        let scorer = scorer();
        let t = term("calm person meditation");
        assert_eq!(scorer.score(&image(1, "lake", 10), &t, CategoryClass::Generic), 0);
        assert_eq!(scorer.score(&image(2, "lake", 11), &t, CategoryClass::Generic), 1);
    }

    #[test]
    fn test_filter_keeps_relevant_and_drops_used() {
        let scorer = scorer();
        let t = term("achievement success goal reaching");
        let batch = vec![
            image(1, "achievement, goal, person", 20),
            image(2, "flowers", 20),
            image(3, "success, person", 20),
        ];
        let mut used = UsedImages::default();

        let kept: Vec<u64> = scorer
            .filter_batch(&batch, &used, &t, CategoryClass::Generic)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(kept, vec![1, 3]);

        used.mark(&batch[0]);
        let kept: Vec<u64> = scorer
            .filter_batch(&batch, &used, &t, CategoryClass::Generic)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(kept, vec![3]);
    }

    #[test]
    fn test_filter_falls_back_to_unused_batch() {
        let scorer = scorer();
        let t = term("achievement success goal reaching");
        let batch = vec![image(1, "flowers", 0), image(2, "trees", 0), image(3, "sky", 0)];
        let mut used = UsedImages::default();
        used.mark(&batch[1]);

        let kept: Vec<u64> = scorer
            .filter_batch(&batch, &used, &t, CategoryClass::Generic)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn test_filter_empty_when_all_used() {
        let scorer = scorer();
        let t = term("happy person smiling joy");
        let batch = vec![image(1, "happy, person", 50)];
        let mut used = UsedImages::default();
        used.mark(&batch[0]);

        assert!(scorer
            .filter_batch(&batch, &used, &t, CategoryClass::Generic)
            .is_empty());
    }
}
