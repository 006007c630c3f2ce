use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_recs::{
    config::{CacheBackend, Config, StoreKind},
    db::{
        create_pool, create_redis_client, Catalog, MemoryCatalog, MemoryOrderHistory,
        OrderHistory, PgCatalog, PgOrderHistory, RedisStore,
    },
    routes::{create_router, AppState},
    services::{MemoryStore, RecommendationCache, RecommendationGateway},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (catalog, orders): (Arc<dyn Catalog>, Arc<dyn OrderHistory>) = match config.store {
        StoreKind::Postgres => {
            let pool = Arc::new(create_pool(&config.database_url).await?);
            tracing::info!("Connected to PostgreSQL");
            (
                Arc::new(PgCatalog::new(pool.clone())),
                Arc::new(PgOrderHistory::new(pool)),
            )
        }
        StoreKind::Memory => {
            tracing::warn!("Using empty in-memory catalog and order history");
            (
                Arc::new(MemoryCatalog::default()),
                Arc::new(MemoryOrderHistory::default()),
            )
        }
    };

    let ttl = Duration::from_secs(config.cache_ttl_secs);
    let cache = match config.cache_backend {
        CacheBackend::Memory => RecommendationCache::new(Arc::new(MemoryStore::new(ttl))),
        CacheBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            RecommendationCache::new(Arc::new(RedisStore::new(client, config.cache_ttl_secs)))
        }
    };
    tracing::info!(backend = ?config.cache_backend, ttl_secs = config.cache_ttl_secs, "Recommendation cache ready");

    let gateway = RecommendationGateway::new(catalog, orders, Arc::new(cache));
    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        admin_role: config.admin_role.clone(),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
