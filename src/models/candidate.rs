use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Photo shown when an item has no photos at all
pub const DEFAULT_PHOTO_URL: &str = "/images/placeholder-business.jpg";

/// Photo attached to a candidate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRow {
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Candidate item exactly as a store returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub city: Option<String>,
    pub region: Option<String>,
    pub verified: bool,
    pub featured: bool,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    /// Photos in display order
    pub photos: Vec<PhotoRow>,
}

/// Display shape of a recommended item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub photo: String,
    pub category_name: Option<String>,
    pub location: Option<String>,
    pub verified: bool,
    pub featured: bool,
}

impl CandidateItem {
    /// Maps a raw row into its display shape
    pub fn from_row(row: CandidateRow, placeholder_photo_url: &str) -> Self {
        let photo = representative_photo(&row.photos)
            .map(|p| p.url.clone())
            .unwrap_or_else(|| placeholder_photo_url.to_string());
        let location = format_location(row.city.as_deref(), row.region.as_deref());

        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            rating: row.rating,
            review_count: row.review_count,
            photo,
            category_name: row.category_name,
            location,
            verified: row.verified,
            featured: row.featured,
        }
    }
}

/// Primary-flagged photo, else the first one
pub fn representative_photo(photos: &[PhotoRow]) -> Option<&PhotoRow> {
    photos
        .iter()
        .find(|p| p.is_primary)
        .or_else(|| photos.first())
}

fn format_location(city: Option<&str>, region: Option<&str>) -> Option<String> {
    let city = city.map(str::trim).filter(|s| !s.is_empty());
    let region = region.map(str::trim).filter(|s| !s.is_empty());

    match (city, region) {
        (Some(city), Some(region)) => Some(format!("{}, {}", city, region)),
        (Some(part), None) | (None, Some(part)) => Some(part.to_string()),
        (None, None) => None,
    }
}

/// Orders ratings highest first with unrated items last
pub fn rating_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Personalized (or fallback) recommendation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub items: Vec<CandidateItem>,
    /// Name of the top-weighted category, `None` when no signal existed
    pub based_on: Option<String>,
    /// True whenever at least one category signal existed
    pub has_activity: bool,
}

impl RecommendationResult {
    /// Result for a user with nothing to go on
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            based_on: None,
            has_activity: false,
        }
    }
}
