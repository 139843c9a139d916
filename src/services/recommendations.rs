use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::Config,
    db::RecommendationStore,
    error::AppResult,
    models::{
        CandidateItem, CategoryAffinity, InteractedItem, RecommendationResult, ViewedCategory,
        DEFAULT_PHOTO_URL,
    },
    services::affinity,
};

/// Result size used when the caller does not name one
pub const DEFAULT_LIMIT: usize = 6;

/// How many of the best categories feed candidate retrieval
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Default headroom for exclusion filtering: fetch `limit * OVER_FETCH_FACTOR` candidates.
/// A heuristic margin, not a guarantee that `limit` items survive.
pub const OVER_FETCH_FACTOR: usize = 2;

/// Tunables for the recommender
#[derive(Debug, Clone)]
pub struct RecommenderSettings {
    /// Values below 1 are treated as 1
    pub over_fetch_factor: usize,
    pub placeholder_photo_url: String,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            over_fetch_factor: OVER_FETCH_FACTOR,
            placeholder_photo_url: DEFAULT_PHOTO_URL.to_string(),
        }
    }
}

impl From<&Config> for RecommenderSettings {
    fn from(config: &Config) -> Self {
        Self {
            over_fetch_factor: config.over_fetch_factor,
            placeholder_photo_url: config.placeholder_photo_url.clone(),
        }
    }
}

/// Category-affinity recommender
///
/// Scores a user's saved items (+3 each), reviews (+2 each) and recently viewed
/// categories (+1 per view), then recommends the best rated items from the top
/// categories that the user has not already saved or reviewed.
///
/// Holds no state between calls; every result is computed from the store.
pub struct Recommender {
    store: Arc<dyn RecommendationStore>,
    settings: RecommenderSettings,
}

impl Recommender {
    pub fn new(store: Arc<dyn RecommendationStore>, settings: RecommenderSettings) -> Self {
        Self { store, settings }
    }

    /// Personalized recommendations
    ///
    /// Without any signal (no user, no resolvable views) the result is empty with
    /// `has_activity == false`. With a signal but no surviving candidates the result is
    /// empty with `has_activity == true` and `based_on` naming the top category.
    #[instrument(skip(self, recently_viewed), fields(store = self.store.name()))]
    pub async fn get_recommendations(
        &self,
        user_id: Option<Uuid>,
        recently_viewed: &[ViewedCategory],
        limit: usize,
    ) -> AppResult<RecommendationResult> {
        let (saved, reviewed) = match user_id {
            Some(user_id) => {
                tokio::try_join!(
                    self.store.saved_items(user_id),
                    self.store.reviewed_items(user_id)
                )?
            }
            None => (Vec::new(), Vec::new()),
        };

        let viewed_signals = if recently_viewed.is_empty() {
            Vec::new()
        } else {
            let names: Vec<String> = recently_viewed
                .iter()
                .map(|v| v.category_name.clone())
                .collect();
            let known = self.store.resolve_categories(&names).await?;
            affinity::resolve_viewed(recently_viewed, &known)
        };

        let affinities = affinity::rank_affinities(&saved, &reviewed, viewed_signals);

        let Some(top) = affinities.first() else {
            tracing::debug!("No affinity signal available");
            return Ok(RecommendationResult::empty());
        };
        let based_on = top.category_name.clone();

        tracing::debug!(
            saved = saved.len(),
            reviewed = reviewed.len(),
            categories = affinities.len(),
            top_category = %based_on,
            top_weight = top.total_weight,
            "Category affinities computed"
        );

        let items = self
            .personalized_candidates(&affinities, &saved, &reviewed, limit)
            .await?;

        tracing::info!(
            items = items.len(),
            based_on = %based_on,
            "Personalized recommendations ready"
        );

        Ok(RecommendationResult {
            items,
            based_on: Some(based_on),
            has_activity: true,
        })
    }

    /// Featured-then-best-rated items, without any personalization
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn get_fallback_recommendations(&self, limit: usize) -> AppResult<Vec<CandidateItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = self.store.featured_candidates(limit).await?;

        let items: Vec<CandidateItem> = rows
            .into_iter()
            .take(limit)
            .map(|row| CandidateItem::from_row(row, &self.settings.placeholder_photo_url))
            .collect();

        tracing::debug!(items = items.len(), "Fallback recommendations ready");

        Ok(items)
    }

    /// Personalized recommendations, or the fallback list when there is no signal at all
    pub async fn recommend_or_fallback(
        &self,
        user_id: Option<Uuid>,
        recently_viewed: &[ViewedCategory],
        limit: usize,
    ) -> AppResult<RecommendationResult> {
        let result = self
            .get_recommendations(user_id, recently_viewed, limit)
            .await?;

        if result.has_activity {
            return Ok(result);
        }

        Ok(RecommendationResult {
            items: self.get_fallback_recommendations(limit).await?,
            based_on: None,
            has_activity: false,
        })
    }

    /// Fetches, filters and maps candidates from the top categories
    async fn personalized_candidates(
        &self,
        affinities: &[CategoryAffinity],
        saved: &[InteractedItem],
        reviewed: &[InteractedItem],
        limit: usize,
    ) -> AppResult<Vec<CandidateItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let category_ids: Vec<Uuid> = affinities
            .iter()
            .take(TOP_CATEGORY_COUNT)
            .map(|a| a.category_id)
            .collect();
        let fetch_limit = limit.saturating_mul(self.settings.over_fetch_factor.max(1));

        let rows = self
            .store
            .candidates_in_categories(&category_ids, fetch_limit)
            .await?;

        let excluded: HashSet<Uuid> = saved
            .iter()
            .chain(reviewed.iter())
            .map(|item| item.item_id)
            .collect();

        let fetched = rows.len();
        let items: Vec<CandidateItem> = rows
            .into_iter()
            .filter(|row| !excluded.contains(&row.id))
            .take(limit)
            .map(|row| CandidateItem::from_row(row, &self.settings.placeholder_photo_url))
            .collect();

        if items.len() < limit && fetched >= fetch_limit {
            tracing::warn!(
                fetched,
                excluded = excluded.len(),
                returned = items.len(),
                limit,
                "Exclusion left fewer items than requested; consider a larger over-fetch factor"
            );
        }

        Ok(items)
    }
}
