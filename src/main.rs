use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use directory_api::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    db::{
        create_pool, create_redis_client, Cache, CachedRecommendationStore,
        PgRecommendationStore, RecommendationStore, RestRecommendationStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("directory_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn RecommendationStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            Arc::new(PgRecommendationStore::new(pool))
        }
        StoreBackend::Rest => {
            let rest_url = config
                .rest_url
                .clone()
                .context("REST_URL is required for the rest store backend")?;
            let api_key = config
                .rest_api_key
                .clone()
                .context("REST_API_KEY is required for the rest store backend")?;
            Arc::new(RestRecommendationStore::new(rest_url, api_key))
        }
    };

    let (store, cache_handle): (Arc<dyn RecommendationStore>, _) = match &config.redis_url {
        Some(redis_url) => {
            let (cache, handle) = Cache::new(create_redis_client(redis_url)?).await;
            (
                Arc::new(CachedRecommendationStore::new(store, cache)),
                Some(handle),
            )
        }
        None => (store, None),
    };

    tracing::info!(
        store = store.name(),
        category_cache = cache_handle.is_some(),
        "Recommendation store ready"
    );

    let app = create_router(AppState::from_config(store, &config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
