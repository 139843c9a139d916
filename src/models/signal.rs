use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Where a piece of affinity evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Saved,
    Reviewed,
    Viewed,
}

impl SignalSource {
    /// Weight contributed by a single occurrence of this source
    pub fn unit_weight(self) -> u32 {
        match self {
            SignalSource::Saved => 3,
            SignalSource::Reviewed => 2,
            SignalSource::Viewed => 1,
        }
    }
}

impl Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSource::Saved => write!(f, "saved"),
            SignalSource::Reviewed => write!(f, "reviewed"),
            SignalSource::Viewed => write!(f, "viewed"),
        }
    }
}

/// Canonical category pair from the authoritative category set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

impl CategoryRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// An item the user saved or reviewed
///
/// Items without a category still count toward exclusion, they just produce no signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractedItem {
    pub item_id: Uuid,
    pub category: Option<CategoryRef>,
}

impl InteractedItem {
    pub fn new(item_id: Uuid, category: Option<CategoryRef>) -> Self {
        Self { item_id, category }
    }
}

/// Lightweight browsing history: a category name and how often it was viewed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewedCategory {
    pub category_name: String,
    pub view_count: u32,
}

/// One entry of a raw browsing history as clients send it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ViewedEntry {
    /// A single view of a category
    Name(String),
    /// An already aggregated count
    Counted(ViewedCategory),
}

impl ViewedCategory {
    pub fn new(category_name: impl Into<String>, view_count: u32) -> Self {
        Self {
            category_name: category_name.into(),
            view_count,
        }
    }

    /// Folds raw history entries into one record per category name
    ///
    /// Names are compared case-insensitively and trimmed; the first spelling seen is kept,
    /// as is first-seen order. Blank names are skipped.
    pub fn tally(entries: impl IntoIterator<Item = ViewedEntry>) -> Vec<ViewedCategory> {
        let mut tallied: Vec<ViewedCategory> = Vec::new();

        for entry in entries {
            let (name, count) = match entry {
                ViewedEntry::Name(name) => (name, 1),
                ViewedEntry::Counted(viewed) => (viewed.category_name, viewed.view_count),
            };

            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let key = name.to_lowercase();
            match tallied
                .iter_mut()
                .find(|v| v.category_name.to_lowercase() == key)
            {
                Some(existing) => existing.view_count = existing.view_count.saturating_add(count),
                None => tallied.push(ViewedCategory::new(name, count)),
            }
        }

        tallied
    }
}

/// One discrete piece of affinity evidence
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub category: CategoryRef,
    pub source: SignalSource,
    pub weight: u32,
}

impl Signal {
    pub fn saved(category: CategoryRef) -> Self {
        Self::from_source(category, SignalSource::Saved, 1)
    }

    pub fn reviewed(category: CategoryRef) -> Self {
        Self::from_source(category, SignalSource::Reviewed, 1)
    }

    pub fn viewed(category: CategoryRef, view_count: u32) -> Self {
        Self::from_source(category, SignalSource::Viewed, view_count)
    }

    fn from_source(category: CategoryRef, source: SignalSource, occurrences: u32) -> Self {
        Self {
            category,
            source,
            weight: source.unit_weight().saturating_mul(occurrences),
        }
    }
}

/// Accumulated weight for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAffinity {
    pub category_id: Uuid,
    pub category_name: String,
    pub total_weight: u32,
    /// Source that created this record; later signals never replace it
    pub dominant_source: SignalSource,
}
