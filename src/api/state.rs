use std::sync::Arc;

use crate::{
    config::Config,
    db::RecommendationStore,
    error::{AppError, AppResult},
    services::{
        recommendations::DEFAULT_LIMIT, Recommender, RecommenderSettings,
    },
};

/// Bounds applied to caller-supplied result sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: 50,
        }
    }
}

impl LimitPolicy {
    /// Applies the default and rejects sizes outside `1..=max_limit`
    pub fn resolve(&self, requested: Option<usize>) -> AppResult<usize> {
        let limit = requested.unwrap_or(self.default_limit);

        if limit == 0 || limit > self.max_limit {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                self.max_limit
            )));
        }

        Ok(limit)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub limits: LimitPolicy,
}

impl AppState {
    pub fn new(recommender: Arc<Recommender>, limits: LimitPolicy) -> Self {
        Self {
            recommender,
            limits,
        }
    }

    /// State over `store` with default settings and limits
    pub fn with_store(store: Arc<dyn RecommendationStore>) -> Self {
        let recommender = Recommender::new(store, RecommenderSettings::default());
        Self::new(Arc::new(recommender), LimitPolicy::default())
    }

    /// State over `store` configured from the environment
    pub fn from_config(store: Arc<dyn RecommendationStore>, config: &Config) -> Self {
        let recommender = Recommender::new(store, RecommenderSettings::from(config));
        let limits = LimitPolicy {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        };
        Self::new(Arc::new(recommender), limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_when_absent() {
        assert_eq!(LimitPolicy::default().resolve(None).unwrap(), 6);
    }

    #[test]
    fn test_limit_bounds() {
        let limits = LimitPolicy::default();

        assert_eq!(limits.resolve(Some(50)).unwrap(), 50);
        assert!(matches!(limits.resolve(Some(0)), Err(AppError::InvalidInput(_))));
        assert!(matches!(limits.resolve(Some(51)), Err(AppError::InvalidInput(_))));
    }
}
