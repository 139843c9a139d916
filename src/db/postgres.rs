use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{CandidateRow, CategoryRef, InteractedItem, PhotoRow},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const SAVED_ITEMS_SQL: &str = r#"
    SELECT s.business_id AS item_id, c.id AS category_id, c.name AS category_name
    FROM saved_businesses s
    JOIN businesses b ON b.id = s.business_id
    LEFT JOIN categories c ON c.id = b.category_id
    WHERE s.user_id = $1
    ORDER BY s.created_at, s.business_id
"#;

const REVIEWED_ITEMS_SQL: &str = r#"
    SELECT r.business_id AS item_id, c.id AS category_id, c.name AS category_name
    FROM reviews r
    JOIN businesses b ON b.id = r.business_id
    LEFT JOIN categories c ON c.id = b.category_id
    WHERE r.user_id = $1
    ORDER BY r.created_at, r.business_id
"#;

const RESOLVE_CATEGORIES_SQL: &str = r#"
    SELECT id, name
    FROM categories
    WHERE lower(name) = ANY($1)
"#;

// Shared projection for candidate queries; photos arrive as a JSON array in display order
const CANDIDATE_SELECT: &str = r#"
    SELECT b.id, b.name, b.slug, b.description,
           b.rating::float8 AS rating,
           b.review_count,
           b.city, b.state AS region,
           b.is_verified AS verified,
           b.is_featured AS featured,
           b.category_id,
           c.name AS category_name,
           COALESCE(
               (SELECT json_agg(json_build_object('url', p.url, 'is_primary', p.is_primary)
                                ORDER BY p.display_order, p.created_at)
                FROM business_photos p
                WHERE p.business_id = b.id),
               '[]'::json
           ) AS photos
    FROM businesses b
    LEFT JOIN categories c ON c.id = b.category_id
"#;

#[derive(Debug, FromRow)]
struct InteractionRecord {
    item_id: Uuid,
    category_id: Option<Uuid>,
    category_name: Option<String>,
}

impl From<InteractionRecord> for InteractedItem {
    fn from(record: InteractionRecord) -> Self {
        let category = match (record.category_id, record.category_name) {
            (Some(id), Some(name)) => Some(CategoryRef { id, name }),
            _ => None,
        };

        InteractedItem {
            item_id: record.item_id,
            category,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct CandidateRecord {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    rating: Option<f64>,
    review_count: Option<i32>,
    city: Option<String>,
    region: Option<String>,
    verified: Option<bool>,
    featured: Option<bool>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    photos: Json<Vec<PhotoRow>>,
}

impl TryFrom<CandidateRecord> for CandidateRow {
    type Error = AppError;

    fn try_from(record: CandidateRecord) -> AppResult<Self> {
        let review_count = u32::try_from(record.review_count.unwrap_or(0)).map_err(|_| {
            AppError::MalformedResponse(format!(
                "Negative review count for business {}",
                record.id
            ))
        })?;

        Ok(CandidateRow {
            id: record.id,
            name: record.name,
            slug: record.slug,
            description: record.description,
            rating: record.rating,
            review_count,
            city: record.city,
            region: record.region,
            verified: record.verified.unwrap_or(false),
            featured: record.featured.unwrap_or(false),
            category_id: record.category_id,
            category_name: record.category_name,
            photos: record.photos.0,
        })
    }
}

/// Recommendation store backed by a direct PostgreSQL connection
#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn interactions(&self, sql: &str, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        let records: Vec<InteractionRecord> = sqlx::query_as(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(InteractedItem::from).collect())
    }
}

fn to_candidate_rows(records: Vec<CandidateRecord>) -> AppResult<Vec<CandidateRow>> {
    records.into_iter().map(CandidateRow::try_from).collect()
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn saved_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.interactions(SAVED_ITEMS_SQL, user_id).await
    }

    async fn reviewed_items(&self, user_id: Uuid) -> AppResult<Vec<InteractedItem>> {
        self.interactions(REVIEWED_ITEMS_SQL, user_id).await
    }

    async fn resolve_categories(&self, names: &[String]) -> AppResult<Vec<CategoryRef>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();

        let records: Vec<CategoryRecord> = sqlx::query_as(RESOLVE_CATEGORIES_SQL)
            .bind(&lowered[..])
            .fetch_all(&self.pool)
            .await?;

        Ok(records
            .into_iter()
            .map(|r| CategoryRef::new(r.id, r.name))
            .collect())
    }

    async fn candidates_in_categories(
        &self,
        category_ids: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        if category_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{} WHERE b.category_id = ANY($1) ORDER BY b.rating DESC NULLS LAST, b.id LIMIT $2",
            CANDIDATE_SELECT
        );

        let records: Vec<CandidateRecord> = sqlx::query_as(&sql)
            .bind(category_ids)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        to_candidate_rows(records)
    }

    async fn featured_candidates(&self, limit: usize) -> AppResult<Vec<CandidateRow>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{} ORDER BY b.is_featured DESC, b.rating DESC NULLS LAST, b.id LIMIT $1",
            CANDIDATE_SELECT
        );

        let records: Vec<CandidateRecord> = sqlx::query_as(&sql)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        to_candidate_rows(records)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CandidateRecord {
        CandidateRecord {
            id: Uuid::from_u128(5),
            name: "Volcano Hikes".to_string(),
            slug: "volcano-hikes".to_string(),
            description: Some("Guided hikes".to_string()),
            rating: None,
            review_count: None,
            city: Some("Volcano".to_string()),
            region: None,
            verified: None,
            featured: Some(true),
            category_id: None,
            category_name: None,
            photos: Json(vec![]),
        }
    }

    #[test]
    fn test_candidate_record_defaults_nullable_columns() {
        let row = CandidateRow::try_from(record()).unwrap();

        assert_eq!(row.review_count, 0);
        assert!(!row.verified);
        assert!(row.featured);
        assert!(row.photos.is_empty());
    }

    #[test]
    fn test_candidate_record_rejects_negative_review_count() {
        let mut bad = record();
        bad.review_count = Some(-1);

        let result = CandidateRow::try_from(bad);
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }

    #[test]
    fn test_interaction_without_category() {
        let item = InteractedItem::from(InteractionRecord {
            item_id: Uuid::from_u128(9),
            category_id: None,
            category_name: None,
        });

        assert_eq!(item.item_id, Uuid::from_u128(9));
        assert_eq!(item.category, None);
    }

    #[test]
    fn test_interaction_with_category() {
        let item = InteractedItem::from(InteractionRecord {
            item_id: Uuid::from_u128(9),
            category_id: Some(Uuid::from_u128(1)),
            category_name: Some("Restaurants".to_string()),
        });

        assert_eq!(
            item.category,
            Some(CategoryRef::new(Uuid::from_u128(1), "Restaurants"))
        );
    }

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(12), 12);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
