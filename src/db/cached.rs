use std::sync::Arc;

use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey, RecommendationStore},
    error::AppResult,
    models::{CandidateRow, CategoryRef, InteractedItem},
};

/// How long a category name lookup stays cached (1 hour)
const CATEGORY_CACHE_TTL: u64 = 3600;

/// Store decorator that caches category name lookups in Redis
///
/// Only `resolve_categories` goes through the cache. User history and candidate pools are
/// always read from the wrapped store.
#[derive(Clone)]
pub struct CachedRecommendationStore {
    inner: Arc<dyn RecommendationStore>,
    cache: Cache,
}

impl CachedRecommendationStore {
    pub fn new(inner: Arc<dyn RecommendationStore>, cache: Cache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for CachedRecommendationStore {
    async fn saved_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.inner.saved_items(user_id).await
    }

    async fn reviewed_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.inner.reviewed_items(user_id).await
    }

    async fn resolve_categories(&self, names: &[String]) -> AppResult<Vec<CategoryRef>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::CategoryNames(names.to_vec());

        cached!(self.cache, key, CATEGORY_CACHE_TTL, async {
            tracing::debug!(cache_key = %key, "Category lookup cache miss");
            self.inner.resolve_categories(names).await
        })
    }

    async fn candidates_in_categories(
        &self,
        category_ids: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        self.inner.candidates_in_categories(category_ids, limit).await
    }

    async fn featured_candidates(&self, limit: usize) -> AppResult<Vec<CandidateRow>> {
        self.inner.featured_candidates(limit).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_redis_client, MockRecommendationStore};

    const USER: Uuid = Uuid::from_u128(0xabc);

    async fn unreachable_cache() -> Cache {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client).await;
        cache
    }

    fn interacted(n: u128) -> InteractedItem {
        InteractedItem::new(
            Uuid::from_u128(n),
            Some(CategoryRef::new(Uuid::from_u128(1), "Restaurants")),
        )
    }

    #[tokio::test]
    async fn test_uncached_lookups_go_to_inner_store() {
        let mut inner = MockRecommendationStore::new();
        inner.expect_name().return_const("postgres");
        inner
            .expect_saved_items()
            .withf(|user_id| *user_id == USER)
            .times(1)
            .returning(|_| Ok(vec![interacted(10)]));
        inner
            .expect_reviewed_items()
            .times(1)
            .returning(|_| Ok(vec![interacted(11), interacted(12)]));
        inner
            .expect_candidates_in_categories()
            .withf(|ids, limit| ids.to_vec() == vec![Uuid::from_u128(1)] && *limit == 8)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        inner
            .expect_featured_candidates()
            .withf(|limit| *limit == 3)
            .times(1)
            .returning(|_| Ok(vec![]));

        let store = CachedRecommendationStore::new(Arc::new(inner), unreachable_cache().await);

        assert_eq!(store.name(), "postgres");
        assert_eq!(store.saved_items(USER).await.unwrap(), vec![interacted(10)]);
        assert_eq!(store.reviewed_items(USER).await.unwrap().len(), 2);
        assert!(store
            .candidates_in_categories(&[Uuid::from_u128(1)], 8)
            .await
            .unwrap()
            .is_empty());
        assert!(store.featured_candidates(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_list_skips_cache_and_store() {
        let mut inner = MockRecommendationStore::new();
        inner.expect_resolve_categories().times(0);

        let store = CachedRecommendationStore::new(Arc::new(inner), unreachable_cache().await);

        assert!(store.resolve_categories(&[]).await.unwrap().is_empty());
    }
}
