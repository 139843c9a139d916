//! Data-access contract for the recommender
//!
//! The engine only ever talks to a `RecommendationStore`. Adapters exist for a direct
//! PostgreSQL connection, the hosted store's REST endpoint, and an in-memory catalog;
//! any of them can be wrapped in the Redis-backed category cache.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CandidateRow, CategoryRef, InteractedItem},
};

pub mod cached;
pub mod memory;
pub mod postgres;
pub mod redis;
pub mod rest;

pub use cached::CachedRecommendationStore;
pub use memory::MemoryRecommendationStore;
pub use postgres::{create_pool, PgRecommendationStore};
pub use self::redis::{create_redis_client, Cache, CacheKey};
pub use rest::RestRecommendationStore;

/// Read-only queries the recommender issues against the directory data
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Items the user saved, each annotated with its category
    async fn saved_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>>;

    /// Items the user reviewed, each annotated with its category
    async fn reviewed_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>>;

    /// Canonical categories whose name matches one of `names`, ignoring case
    async fn resolve_categories(&self, names: &[String]) -> AppResult<Vec<CategoryRef>>;

    /// Candidates in any of the given categories, best rated first, unrated last
    async fn candidates_in_categories(
        &self,
        category_ids: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<CandidateRow>>;

    /// Candidates with featured items first, then best rated, unrated last
    async fn featured_candidates(&self, limit: usize) -> AppResult<Vec<CandidateRow>>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
