use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::insights::{load_dashboard, DashboardData};
use crate::{
    config::InsightConfig,
    store::{InventoryStore, StoreResult},
};

/// Short-lived per-store cache of aggregated dashboards.
///
/// Entries older than the TTL are treated as absent. Writes that change a
/// store's stock or catalogue call [`DashboardCache::invalidate`], which also
/// bumps the store's generation so a load that started before the write is
/// not cached after it.
pub struct DashboardCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Uuid, (Instant, Arc<DashboardData>)>,
    generations: HashMap<Uuid, u64>,
}

impl CacheState {
    fn generation(&self, store_id: Uuid) -> u64 {
        self.generations.get(&store_id).copied().unwrap_or(0)
    }

    fn store(&mut self, ttl: Duration, store_id: Uuid, data: Arc<DashboardData>) {
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        self.entries.insert(store_id, (Instant::now(), data));
    }
}

impl DashboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub async fn get(&self, store_id: Uuid) -> Option<Arc<DashboardData>> {
        let state = self.state.read().await;
        state
            .entries
            .get(&store_id)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, data)| Arc::clone(data))
    }

    /// Invalidation counter for a store; compare before and after a load.
    pub async fn generation(&self, store_id: Uuid) -> u64 {
        self.state.read().await.generation(store_id)
    }

    pub async fn insert(&self, store_id: Uuid, data: DashboardData) -> Arc<DashboardData> {
        let data = Arc::new(data);
        self.state
            .write()
            .await
            .store(self.ttl, store_id, Arc::clone(&data));
        data
    }

    /// Caches `data` only if the store has not been invalidated since
    /// `generation` was read. The data is returned either way.
    pub async fn insert_if_current(
        &self,
        store_id: Uuid,
        generation: u64,
        data: DashboardData,
    ) -> Arc<DashboardData> {
        let data = Arc::new(data);
        let mut state = self.state.write().await;
        if state.generation(store_id) == generation {
            state.store(self.ttl, store_id, Arc::clone(&data));
        } else {
            log::debug!("dashboard for store {} changed while loading; not cached", store_id);
        }
        data
    }

    pub async fn invalidate(&self, store_id: Uuid) {
        let mut state = self.state.write().await;
        state.entries.remove(&store_id);
        *state.generations.entry(store_id).or_insert(0) += 1;
    }

    /// Returns the cached dashboard, aggregating and caching it on a miss.
    /// Concurrent misses may both aggregate.
    pub async fn get_or_load(
        &self,
        store: &dyn InventoryStore,
        store_id: Uuid,
        config: &InsightConfig,
        now: DateTime<Utc>,
    ) -> StoreResult<Arc<DashboardData>> {
        if let Some(hit) = self.get(store_id).await {
            return Ok(hit);
        }
        let generation = self.generation(store_id).await;
        let data = load_dashboard(store, store_id, config, now).await?;
        Ok(self.insert_if_current(store_id, generation, data).await)
    }
}
