use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CategoryAffinity, CategoryRef, InteractedItem, Signal, ViewedCategory};

/// Accumulates signals into per-category affinity records
///
/// Records keep the order in which their category was first seen, which is what
/// breaks ties once they are ranked.
#[derive(Debug, Default)]
pub struct AffinityTally {
    records: Vec<CategoryAffinity>,
    positions: HashMap<Uuid, usize>,
}

impl AffinityTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one signal's weight to its category
    pub fn add(&mut self, signal: Signal) {
        if signal.weight == 0 {
            return;
        }

        match self.positions.get(&signal.category.id) {
            Some(&position) => {
                let record = &mut self.records[position];
                record.total_weight = record.total_weight.saturating_add(signal.weight);
            }
            None => {
                self.positions
                    .insert(signal.category.id, self.records.len());
                self.records.push(CategoryAffinity {
                    category_id: signal.category.id,
                    category_name: signal.category.name,
                    total_weight: signal.weight,
                    dominant_source: signal.source,
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Affinities sorted by descending weight, ties in first-seen order
    pub fn ranked(mut self) -> Vec<CategoryAffinity> {
        // sort_by is stable
        self.records
            .sort_by(|a, b| b.total_weight.cmp(&a.total_weight));
        self.records
    }
}

/// Resolves viewed category names against the authoritative categories
///
/// Matching is case-insensitive and exact. Names without a match are dropped.
pub fn resolve_viewed(viewed: &[ViewedCategory], known: &[CategoryRef]) -> Vec<Signal> {
    let by_name: HashMap<String, &CategoryRef> = known
        .iter()
        .map(|category| (category.name.to_lowercase(), category))
        .collect();

    viewed
        .iter()
        .filter_map(|entry| {
            let key = entry.category_name.to_lowercase();
            match by_name.get(&key) {
                Some(category) => Some(Signal::viewed((*category).clone(), entry.view_count)),
                None => {
                    tracing::debug!(
                        category_name = %entry.category_name,
                        "Viewed category did not resolve, skipping"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Builds the ranked affinity list from all three history sources
///
/// Saved signals are applied first, then reviewed, then viewed.
pub fn rank_affinities(
    saved: &[InteractedItem],
    reviewed: &[InteractedItem],
    viewed: Vec<Signal>,
) -> Vec<CategoryAffinity> {
    let mut tally = AffinityTally::new();

    for category in saved.iter().filter_map(|item| item.category.clone()) {
        tally.add(Signal::saved(category));
    }

    for category in reviewed.iter().filter_map(|item| item.category.clone()) {
        tally.add(Signal::reviewed(category));
    }

    for signal in viewed {
        tally.add(signal);
    }

    tally.ranked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalSource;

    fn restaurants() -> CategoryRef {
        CategoryRef::new(Uuid::from_u128(1), "Restaurants")
    }

    fn hardware() -> CategoryRef {
        CategoryRef::new(Uuid::from_u128(2), "Hardware")
    }

    fn tours() -> CategoryRef {
        CategoryRef::new(Uuid::from_u128(3), "Tours")
    }

    fn item(n: u128, category: CategoryRef) -> InteractedItem {
        InteractedItem::new(Uuid::from_u128(1000 + n), Some(category))
    }

    #[test]
    fn test_saved_and_reviewed_accumulate() {
        let saved = vec![item(1, restaurants())];
        let reviewed = vec![item(2, restaurants()), item(3, restaurants())];

        let ranked = rank_affinities(&saved, &reviewed, vec![]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_weight, 7);
    }

    #[test]
    fn test_reviews_outweigh_single_save() {
        let saved = vec![item(1, restaurants())];
        let reviewed = vec![item(2, hardware()), item(3, hardware())];

        let ranked = rank_affinities(&saved, &reviewed, vec![]);

        assert_eq!(ranked[0].category_name, "Hardware");
        assert_eq!(ranked[0].total_weight, 4);
        assert_eq!(ranked[1].category_name, "Restaurants");
        assert_eq!(ranked[1].total_weight, 3);
    }

    #[test]
    fn test_view_count_scales_weight() {
        let viewed = vec![Signal::viewed(restaurants(), 5)];

        let ranked = rank_affinities(&[], &[], viewed);

        assert_eq!(ranked[0].total_weight, 5);
        assert_eq!(ranked[0].dominant_source, SignalSource::Viewed);
    }

    #[test]
    fn test_first_writer_keeps_attribution() {
        let saved = vec![item(1, tours())];
        let viewed = vec![Signal::viewed(tours(), 20)];

        let ranked = rank_affinities(&saved, &[], viewed);

        assert_eq!(ranked[0].total_weight, 23);
        assert_eq!(ranked[0].dominant_source, SignalSource::Saved);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        // Hardware is seen first (saved) and ties with Restaurants (reviewed + viewed)
        let saved = vec![item(1, hardware())];
        let reviewed = vec![item(2, restaurants())];
        let viewed = vec![Signal::viewed(restaurants(), 1)];

        let ranked = rank_affinities(&saved, &reviewed, viewed);

        assert_eq!(ranked[0].total_weight, ranked[1].total_weight);
        assert_eq!(ranked[0].category_name, "Hardware");
    }

    #[test]
    fn test_items_without_category_produce_no_signal() {
        let saved = vec![InteractedItem::new(Uuid::from_u128(9), None)];

        let ranked = rank_affinities(&saved, &[], vec![]);

        assert!(ranked.is_empty());
    }

    #[test]
    fn test_zero_views_do_not_create_records() {
        let mut tally = AffinityTally::new();
        tally.add(Signal::viewed(tours(), 0));
        assert!(tally.is_empty());
    }

    #[test]
    fn test_resolve_viewed_is_case_insensitive() {
        let viewed = vec![
            ViewedCategory::new("restaurants", 2),
            ViewedCategory::new("HARDWARE", 1),
        ];

        let signals = resolve_viewed(&viewed, &[restaurants(), hardware()]);

        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].category, restaurants());
        assert_eq!(signals[0].weight, 2);
        assert_eq!(signals[1].category, hardware());
    }

    #[test]
    fn test_resolve_viewed_drops_unknown_names() {
        let viewed = vec![
            ViewedCategory::new("Restaurant", 3),
            ViewedCategory::new("Tours", 1),
        ];

        let signals = resolve_viewed(&viewed, &[tours()]);

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].category, tours());
    }

    #[test]
    fn test_resolve_viewed_requires_exact_name() {
        let viewed = vec![
            ViewedCategory::new(" Tours", 4),
            ViewedCategory::new("Tours ", 4),
        ];

        assert!(resolve_viewed(&viewed, &[tours()]).is_empty());
    }
}
