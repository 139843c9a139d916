use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::RecommendationStore,
    error::AppResult,
    models::{rating_desc_nulls_last, CandidateRow, CategoryRef, InteractedItem},
};

/// In-process catalog
pub struct MemoryCatalog {
    pub categories: Vec<CategoryRef>,
    pub candidates: Vec<CandidateRow>,
    pub saved: HashMap<Uuid, Vec<Uuid>>,
    pub reviewed: HashMap<Uuid, Vec<Uuid>>,
}

/// Recommendation store holding the whole catalog in memory
///
/// Orders candidates the same way the database adapters do, with the item id as the
/// final tie-break.
#[derive(Clone)]
pub struct MemoryRecommendationStore {
    inner: Arc<RwLock<MemoryCatalog>>,
}

impl Default for MemoryRecommendationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecommendationStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryCatalog {
                categories: Vec::new(),
                candidates: Vec::new(),
                saved: HashMap::new(),
                reviewed: HashMap::new(),
            })),
        }
    }

    pub async fn add_category(&self, category: CategoryRef) {
        let mut inner = self.inner.write().await;
        inner.categories.push(category);
    }

    pub async fn add_candidate(&self, candidate: CandidateRow) {
        let mut inner = self.inner.write().await;
        inner.candidates.push(candidate);
    }

    /// Records that `user_id` saved `item_id`
    pub async fn save_item(&self, user_id: Uuid, item_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.saved.entry(user_id).or_default().push(item_id);
    }

    /// Records that `user_id` reviewed `item_id`
    pub async fn review_item(&self, user_id: Uuid, item_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.reviewed.entry(user_id).or_default().push(item_id);
    }
}

impl MemoryCatalog {
    fn category(&self, id: Uuid) -> Option<CategoryRef> {
        self.categories.iter().find(|c| c.id == id).cloned()
    }

    fn interactions(&self, item_ids: Option<&Vec<Uuid>>) -> Vec<InteractedItem> {
        item_ids
            .into_iter()
            .flatten()
            .filter_map(|item_id| {
                let candidate = self.candidates.iter().find(|c| c.id == *item_id)?;
                let category = candidate.category_id.and_then(|id| self.category(id));
                Some(InteractedItem::new(*item_id, category))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl RecommendationStore for MemoryRecommendationStore {
    async fn saved_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        let inner = self.inner.read().await;
        Ok(inner.interactions(inner.saved.get(&user_id)))
    }

    async fn reviewed_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        let inner = self.inner.read().await;
        Ok(inner.interactions(inner.reviewed.get(&user_id)))
    }

    async fn resolve_categories(&self, names: &[String]) -> AppResult<Vec<CategoryRef>> {
        let wanted: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let inner = self.inner.read().await;

        Ok(inner
            .categories
            .iter()
            .filter(|c| wanted.contains(&c.name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn candidates_in_categories(
        &self,
        category_ids: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        let inner = self.inner.read().await;

        let mut rows: Vec<CandidateRow> = inner
            .candidates
            .iter()
            .filter(|c| c.category_id.is_some_and(|id| category_ids.contains(&id)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| rating_desc_nulls_last(a.rating, b.rating).then(a.id.cmp(&b.id)));
        rows.truncate(limit);

        Ok(rows)
    }

    async fn featured_candidates(&self, limit: usize) -> AppResult<Vec<CandidateRow>> {
        let inner = self.inner.read().await;

        let mut rows = inner.candidates.clone();
        rows.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then_with(|| rating_desc_nulls_last(a.rating, b.rating))
                .then(a.id.cmp(&b.id))
        });
        rows.truncate(limit);

        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(n: u128, name: &str) -> CategoryRef {
        CategoryRef::new(Uuid::from_u128(n), name)
    }

    fn candidate(n: u128, category_id: u128, rating: Option<f64>, featured: bool) -> CandidateRow {
        CandidateRow {
            id: Uuid::from_u128(n),
            name: format!("Item {}", n),
            slug: format!("item-{}", n),
            description: None,
            rating,
            review_count: 0,
            city: None,
            region: None,
            verified: false,
            featured,
            category_id: Some(Uuid::from_u128(category_id)),
            category_name: None,
            photos: vec![],
        }
    }

    async fn seeded_store() -> MemoryRecommendationStore {
        let store = MemoryRecommendationStore::new();
        store.add_category(category(1, "Restaurants")).await;
        store.add_category(category(2, "Hardware")).await;
        store.add_candidate(candidate(10, 1, None, true)).await;
        store.add_candidate(candidate(11, 1, Some(4.2), false)).await;
        store.add_candidate(candidate(12, 2, Some(4.9), false)).await;
        store.add_candidate(candidate(13, 1, Some(3.1), true)).await;
        store
    }

    #[tokio::test]
    async fn test_candidates_sorted_by_rating_nulls_last() {
        let store = seeded_store().await;

        let rows = store
            .candidates_in_categories(&[Uuid::from_u128(1)], 10)
            .await
            .unwrap();

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(11), Uuid::from_u128(13), Uuid::from_u128(10)]
        );
    }

    #[tokio::test]
    async fn test_featured_candidates_put_featured_first() {
        let store = seeded_store().await;

        let rows = store.featured_candidates(3).await.unwrap();

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(13), Uuid::from_u128(10), Uuid::from_u128(12)]
        );
    }

    #[tokio::test]
    async fn test_interactions_carry_categories() {
        let store = seeded_store().await;
        let user = Uuid::from_u128(99);
        store.save_item(user, Uuid::from_u128(12)).await;
        store.review_item(user, Uuid::from_u128(11)).await;

        let saved = store.saved_items(user).await.unwrap();
        let reviewed = store.reviewed_items(user).await.unwrap();

        assert_eq!(saved[0].category, Some(category(2, "Hardware")));
        assert_eq!(reviewed[0].category, Some(category(1, "Restaurants")));
        assert!(store.saved_items(Uuid::from_u128(100)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_categories_ignores_case() {
        let store = seeded_store().await;

        let resolved = store
            .resolve_categories(&["HARDWARE".to_string(), "Spas".to_string()])
            .await
            .unwrap();

        assert_eq!(resolved, vec![category(2, "Hardware")]);
    }

    #[tokio::test]
    async fn test_resolve_categories_does_not_trim() {
        let store = seeded_store().await;

        let resolved = store
            .resolve_categories(&[" Hardware".to_string()])
            .await
            .unwrap();

        assert!(resolved.is_empty());
    }
}
