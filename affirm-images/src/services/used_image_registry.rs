//! Used-image registry
//!
//! Records the id and display URL of every image handed to a caller so the
//! same image is not served twice. Held in memory only: a process restart
//! forgets all history.
//!
//! Every read-filter-then-mark sequence runs under the registry lock
//! (`with_lock`), so two concurrent resolutions can never claim the same
//! candidate. Provider requests are never issued while the lock is held.

use crate::models::CandidateImage;
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Registry size snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicateStats {
    pub used_ids: usize,
    pub used_urls: usize,
    pub total: usize,
}

/// Id and URL sets behind the registry lock
#[derive(Debug, Default)]
pub struct UsedImages {
    ids: HashSet<u64>,
    urls: HashSet<String>,
}

impl UsedImages {
    /// True if either the id or the URL has been served
    pub fn contains(&self, image: &CandidateImage) -> bool {
        self.ids.contains(&image.id) || self.urls.contains(&image.url)
    }

    /// Claim `image`; false if it was already claimed
    pub fn mark(&mut self, image: &CandidateImage) -> bool {
        if self.contains(image) {
            return false;
        }
        self.ids.insert(image.id);
        self.urls.insert(image.url.clone());
        true
    }

    pub fn stats(&self) -> DuplicateStats {
        DuplicateStats {
            used_ids: self.ids.len(),
            used_urls: self.urls.len(),
            total: self.ids.len() + self.urls.len(),
        }
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.urls.clear();
    }
}

/// Shared used-image registry
pub struct UsedImageRegistry {
    state: Mutex<UsedImages>,
    reset_threshold: usize,
}

impl UsedImageRegistry {
    /// Create an empty registry that clears itself once more than
    /// `reset_threshold` ids + urls are tracked
    pub fn new(reset_threshold: usize) -> Self {
        Self {
            state: Mutex::new(UsedImages::default()),
            reset_threshold,
        }
    }

    pub fn reset_threshold(&self) -> usize {
        self.reset_threshold
    }

    pub async fn stats(&self) -> DuplicateStats {
        self.state.lock().await.stats()
    }

    /// Membership test; never mutates
    pub async fn is_duplicate(&self, image: &CandidateImage) -> bool {
        self.state.lock().await.contains(image)
    }

    /// Atomic insert-if-absent
    pub async fn mark_used(&self, image: &CandidateImage) -> bool {
        let claimed = self.state.lock().await.mark(image);
        if claimed {
            tracing::debug!(image_id = image.id, "Marked image as used");
        }
        claimed
    }

    pub async fn clear(&self) {
        self.state.lock().await.clear();
        tracing::info!("Cleared duplicate image tracking");
    }

    /// Clear the registry if it tracks more than the threshold
    ///
    /// Returns true if it cleared.
    pub async fn auto_reset_if_needed(&self) -> bool {
        let mut state = self.state.lock().await;
        let total = state.stats().total;

        if total > self.reset_threshold {
            state.clear();
            tracing::info!(
                tracked = total,
                threshold = self.reset_threshold,
                "Auto-reset duplicate image tracking"
            );
            return true;
        }

        false
    }

    /// Run `f` with exclusive access to the tracked sets
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut UsedImages) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }
}

impl Default for UsedImageRegistry {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: u64) -> CandidateImage {
        CandidateImage {
            id,
            url: format!("https://cdn.example/{}_640.jpg", id),
            preview_url: String::new(),
            large_url: String::new(),
            user: String::new(),
            tags: String::new(),
            width: 640,
            height: 480,
            likes: 0,
            downloads: 0,
        }
    }

    #[tokio::test]
    async fn test_mark_used_is_insert_if_absent() {
        let registry = UsedImageRegistry::default();

        assert!(registry.mark_used(&image(1)).await);
        assert!(!registry.mark_used(&image(1)).await);

        let stats = registry.stats().await;
        assert_eq!(stats, DuplicateStats { used_ids: 1, used_urls: 1, total: 2 });
    }

    #[tokio::test]
    async fn test_shared_url_counts_as_duplicate() {
        let registry = UsedImageRegistry::default();
        registry.mark_used(&image(1)).await;

        let mut other = image(2);
        other.url = image(1).url;

        assert!(registry.is_duplicate(&other).await);
        assert!(!registry.mark_used(&other).await);
    }

    #[tokio::test]
    async fn test_introspection_does_not_mutate() {
        let registry = UsedImageRegistry::default();
        registry.mark_used(&image(7)).await;
        let before = registry.stats().await;

        for _ in 0..5 {
            assert!(registry.is_duplicate(&image(7)).await);
            assert!(!registry.is_duplicate(&image(8)).await);
            assert_eq!(registry.stats().await, before);
        }
    }

    #[tokio::test]
    async fn test_clear_empties_registry() {
        let registry = UsedImageRegistry::default();
        registry.mark_used(&image(1)).await;
        registry.mark_used(&image(2)).await;

        registry.clear().await;

        assert_eq!(registry.stats().await.total, 0);
        assert!(!registry.is_duplicate(&image(1)).await);
    }

    #[tokio::test]
    async fn test_auto_reset_only_above_threshold() {
        let registry = UsedImageRegistry::new(10);

        // 5 images = 10 tracked entries, not above threshold
        for id in 0..5 {
            registry.mark_used(&image(id)).await;
        }
        assert!(!registry.auto_reset_if_needed().await);
        assert_eq!(registry.stats().await.total, 10);

        registry.mark_used(&image(5)).await;
        assert!(registry.auto_reset_if_needed().await);
        assert_eq!(registry.stats().await.total, 0);
    }
}
