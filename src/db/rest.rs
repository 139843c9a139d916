//! Hosted store REST adapter
//!
//! Talks to the store's PostgREST endpoint (`{base_url}/rest/v1/{table}`). Nested joins are
//! requested as embedded resources and deserialized into private raw types, which are then
//! converted explicitly into the engine's shapes. Payloads that do not match fail the request
//! with `AppError::MalformedResponse` instead of producing half-filled records.

use std::collections::HashSet;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{CandidateRow, CategoryRef, InteractedItem, PhotoRow},
};

const CANDIDATE_COLUMNS: &str = "id,name,slug,description,rating,review_count,city,state,\
is_verified,is_featured,category_id,categories(name),business_photos(url,is_primary)";

const INTERACTION_COLUMNS: &str = "business_id,businesses(category_id,categories(id,name))";

type QueryParams = Vec<(&'static str, String)>;

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: Uuid,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCategoryName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawInteractionBusiness {
    #[serde(default)]
    categories: Option<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    business_id: Uuid,
    /// Null when the business no longer exists
    #[serde(default)]
    businesses: Option<RawInteractionBusiness>,
}

#[derive(Debug, Deserialize)]
struct RawBusiness {
    id: Uuid,
    name: String,
    slug: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    review_count: Option<i64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    is_verified: Option<bool>,
    #[serde(default)]
    is_featured: Option<bool>,
    #[serde(default)]
    category_id: Option<Uuid>,
    #[serde(default)]
    categories: Option<RawCategoryName>,
    #[serde(default)]
    business_photos: Option<Vec<PhotoRow>>,
}

fn convert_interactions(raw: Vec<RawInteraction>) -> Vec<InteractedItem> {
    raw.into_iter()
        .filter_map(|row| match row.businesses {
            Some(business) => Some(InteractedItem {
                item_id: row.business_id,
                category: business
                    .categories
                    .map(|c| CategoryRef::new(c.id, c.name)),
            }),
            None => {
                tracing::debug!(business_id = %row.business_id, "Interaction without business, skipping");
                None
            }
        })
        .collect()
}

fn convert_business(raw: RawBusiness) -> AppResult<CandidateRow> {
    let review_count = u32::try_from(raw.review_count.unwrap_or(0)).map_err(|_| {
        AppError::MalformedResponse(format!("Invalid review count for business {}", raw.id))
    })?;

    Ok(CandidateRow {
        id: raw.id,
        name: raw.name,
        slug: raw.slug,
        description: raw.description,
        rating: raw.rating,
        review_count,
        city: raw.city,
        region: raw.state,
        verified: raw.is_verified.unwrap_or(false),
        featured: raw.is_featured.unwrap_or(false),
        category_id: raw.category_id,
        category_name: raw.categories.map(|c| c.name),
        photos: raw.business_photos.unwrap_or_default(),
    })
}

/// Keeps the categories whose name matches one of `names`, ignoring case
fn match_categories(all: Vec<RawCategory>, names: &[String]) -> Vec<CategoryRef> {
    let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();

    all.into_iter()
        .filter(|c| wanted.contains(&c.name.to_lowercase()))
        .map(|c| CategoryRef::new(c.id, c.name))
        .collect()
}

fn interaction_query(user_id: Uuid) -> QueryParams {
    vec![
        ("select", INTERACTION_COLUMNS.to_string()),
        ("user_id", format!("eq.{}", user_id)),
        ("order", "created_at.asc,business_id.asc".to_string()),
    ]
}

fn candidate_query(category_ids: &[Uuid], limit: usize) -> QueryParams {
    let ids: Vec<String> = category_ids.iter().map(Uuid::to_string).collect();

    vec![
        ("select", CANDIDATE_COLUMNS.to_string()),
        ("category_id", format!("in.({})", ids.join(","))),
        ("order", "rating.desc.nullslast,id.asc".to_string()),
        ("business_photos.order", "display_order.asc".to_string()),
        ("limit", limit.to_string()),
    ]
}

fn featured_query(limit: usize) -> QueryParams {
    vec![
        ("select", CANDIDATE_COLUMNS.to_string()),
        (
            "order",
            "is_featured.desc,rating.desc.nullslast,id.asc".to_string(),
        ),
        ("business_photos.order", "display_order.asc".to_string()),
        ("limit", limit.to_string()),
    ]
}

/// Recommendation store backed by the hosted store's REST endpoint
#[derive(Clone)]
pub struct RestRecommendationStore {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl RestRecommendationStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    /// Fetches and deserializes rows from one table
    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &QueryParams,
    ) -> AppResult<Vec<T>> {
        let response = self
            .http_client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                table = %table,
                status = %status,
                body = %body,
                "Store request failed"
            );
            return Err(AppError::DataStore(format!(
                "{} returned status {}: {}",
                table, status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::MalformedResponse(format!("{} rows: {}", table, e)))
    }

    async fn interactions(&self, table: &str, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        let raw: Vec<RawInteraction> = self.get_rows(table, &interaction_query(user_id)).await?;
        Ok(convert_interactions(raw))
    }
}

#[async_trait::async_trait]
impl RecommendationStore for RestRecommendationStore {
    async fn saved_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.interactions("saved_businesses", user_id).await
    }

    async fn reviewed_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.interactions("reviews", user_id).await
    }

    async fn resolve_categories(&self, names: &[String]) -> AppResult<Vec<CategoryRef>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // The category set is small; match locally rather than escaping ilike patterns
        let all: Vec<RawCategory> = self
            .get_rows("categories", &vec![("select", "id,name".to_string())])
            .await?;

        Ok(match_categories(all, names))
    }

    async fn candidates_in_categories(
        &self,
        category_ids: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        if category_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let raw: Vec<RawBusiness> = self
            .get_rows("businesses", &candidate_query(category_ids, limit))
            .await?;

        raw.into_iter().map(convert_business).collect()
    }

    async fn featured_candidates(&self, limit: usize) -> AppResult<Vec<CandidateRow>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let raw: Vec<RawBusiness> = self.get_rows("businesses", &featured_query(limit)).await?;

        raw.into_iter().map(convert_business).collect()
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
