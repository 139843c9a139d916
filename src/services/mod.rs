pub mod affinity;
pub mod recommendations;

pub use recommendations::{Recommender, RecommenderSettings};
