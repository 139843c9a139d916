mod candidate;
mod signal;

pub use candidate::{
    rating_desc_nulls_last, representative_photo, CandidateItem, CandidateRow, PhotoRow,
    RecommendationResult, DEFAULT_PHOTO_URL,
};
pub use signal::{
    CategoryAffinity, CategoryRef, InteractedItem, Signal, SignalSource, ViewedCategory,
    ViewedEntry,
};
