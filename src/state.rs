use std::sync::Arc;

use crate::{
    config::AppConfig,
    services::{DashboardCache, PredictionQueue},
    store::InventoryStore,
};

/// Shared handles passed to every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub config: Arc<AppConfig>,
    pub dashboard_cache: Arc<DashboardCache>,
    pub predictions: PredictionQueue,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, config: AppConfig, predictions: PredictionQueue) -> Self {
        Self {
            dashboard_cache: Arc::new(DashboardCache::new(config.dashboard_cache_ttl)),
            store,
            config: Arc::new(config),
            predictions,
        }
    }
}
