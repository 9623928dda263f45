mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod store;
mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use dotenvy::dotenv;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::{AppConfig, StorageBackend};
use database::create_database_pool;
use state::AppState;
use store::{InventoryStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn InventoryStore> = match &config.storage {
        StorageBackend::Postgres(url) => Arc::new(PgStore::new(create_database_pool(url).await?)),
        StorageBackend::Memory => {
            log::warn!("STORAGE=memory: data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let (predictions, _worker) =
        services::spawn_prediction_worker(Arc::clone(&store), config.insights.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState::new(store, config, predictions));

    log::info!("Shelfwise listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health))
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/me",
            get(handlers::auth::me).patch(handlers::auth::update_me),
        )
        // Stores
        .route(
            "/api/stores",
            get(handlers::stores::list_stores).post(handlers::stores::create_store),
        )
        .route(
            "/api/stores/:id",
            get(handlers::stores::get_store)
                .patch(handlers::stores::update_store)
                .delete(handlers::stores::delete_store),
        )
        // Products
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/:id",
            get(handlers::products::get_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/api/products/:id/stock", patch(handlers::products::update_stock))
        // Sales and insights
        .route(
            "/api/sales",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route(
            "/api/predictions/:product_id",
            get(handlers::predictions::get_prediction),
        )
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route(
            "/api/assistant",
            post(handlers::assistant::ask).fallback(handlers::assistant::method_not_allowed),
        )
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(1024 * 1024)), // 1MB
        )
        .with_state(state)
}
