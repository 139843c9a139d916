use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{CandidateItem, RecommendationResult, ViewedCategory, ViewedEntry},
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// Authenticated visitor, if any
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Browsing history: category names or `{category_name, view_count}` pairs
    #[serde(default)]
    pub recently_viewed: Vec<ViewedEntry>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Fill the result from the featured list when there is no signal
    #[serde(default = "default_fallback")]
    pub fallback: bool,
}

fn default_fallback() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personalized recommendations for a visitor
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResult>> {
    let limit = state.limits.resolve(request.limit)?;
    let recently_viewed = ViewedCategory::tally(request.recently_viewed);

    tracing::info!(
        request_id = %request_id,
        user_id = ?request.user_id,
        viewed_categories = recently_viewed.len(),
        limit,
        "Processing recommendation request"
    );

    let result = if request.fallback {
        state
            .recommender
            .recommend_or_fallback(request.user_id, &recently_viewed, limit)
            .await?
    } else {
        state
            .recommender
            .get_recommendations(request.user_id, &recently_viewed, limit)
            .await?
    };

    tracing::info!(
        request_id = %request_id,
        items = result.items.len(),
        based_on = ?result.based_on,
        has_activity = result.has_activity,
        "Recommendations completed"
    );

    Ok(Json(result))
}

/// Non-personalized featured and top rated items
pub async fn popular(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<CandidateItem>>> {
    let limit = state.limits.resolve(params.limit)?;

    let items = state.recommender.get_fallback_recommendations(limit).await?;

    tracing::info!(
        request_id = %request_id,
        items = items.len(),
        limit,
        "Popular items served"
    );

    Ok(Json(items))
}
