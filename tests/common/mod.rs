use directory_api::{
    db::MemoryRecommendationStore,
    models::{CandidateRow, CategoryRef, PhotoRow},
};
use uuid::Uuid;

pub const USER: Uuid = Uuid::from_u128(0x5eed);

pub fn restaurants() -> CategoryRef {
    CategoryRef::new(Uuid::from_u128(1), "Restaurants")
}

pub fn hardware() -> CategoryRef {
    CategoryRef::new(Uuid::from_u128(2), "Hardware")
}

pub fn tours() -> CategoryRef {
    CategoryRef::new(Uuid::from_u128(3), "Tours")
}

pub fn item_id(n: u128) -> Uuid {
    Uuid::from_u128(100 + n)
}

pub fn candidate(n: u128, category: &CategoryRef, rating: Option<f64>, featured: bool) -> CandidateRow {
    CandidateRow {
        id: item_id(n),
        name: format!("{} #{}", category.name, n),
        slug: format!("{}-{}", category.name.to_lowercase(), n),
        description: None,
        rating,
        review_count: 1,
        city: Some("Hilo".to_string()),
        region: Some("HI".to_string()),
        verified: n % 2 == 0,
        featured,
        category_id: Some(category.id),
        category_name: Some(category.name.clone()),
        photos: vec![PhotoRow {
            url: format!("https://cdn.example.com/{}.jpg", n),
            is_primary: true,
        }],
    }
}

/// Catalog: restaurants 1-4, hardware 5-6, tours 7-9 (7 and 8 featured)
pub async fn seeded_store() -> MemoryRecommendationStore {
    let store = MemoryRecommendationStore::new();

    for category in [restaurants(), hardware(), tours()] {
        store.add_category(category).await;
    }

    let rows = vec![
        candidate(1, &restaurants(), Some(4.8), false),
        candidate(2, &restaurants(), Some(4.1), false),
        candidate(3, &restaurants(), None, false),
        candidate(4, &restaurants(), Some(3.9), false),
        candidate(5, &hardware(), Some(4.4), false),
        candidate(6, &hardware(), Some(4.0), false),
        candidate(7, &tours(), Some(3.2), true),
        candidate(8, &tours(), None, true),
        candidate(9, &tours(), Some(5.0), false),
    ];
    for row in rows {
        store.add_candidate(row).await;
    }

    store
}
