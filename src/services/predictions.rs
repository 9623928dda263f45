use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::{
    config::InsightConfig,
    models::{Forecast, NewPrediction, Prediction},
    services::insights::{average_daily_sales, days_left, round_to},
    store::{InventoryStore, StoreResult},
};

const QUEUE_CAPACITY: usize = 1024;

pub fn forecast_from(
    stock: i32,
    total_sold: i64,
    config: &InsightConfig,
    calculated_at: DateTime<Utc>,
) -> Forecast {
    let avg = average_daily_sales(total_sold, config);
    Forecast {
        avg_daily_sales: round_to(avg, 2),
        days_left: days_left(stock, avg).map(|d| round_to(d, 2)),
        suggested_reorder_qty: config.reorder_quantity(avg),
        calculated_at,
    }
}

async fn window_total(
    store: &dyn InventoryStore,
    product_id: Uuid,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> StoreResult<i64> {
    let rollups = store.sales_rollup(&[product_id], now - config.window()).await?;
    Ok(rollups.first().map(|r| r.total_sold).unwrap_or(0))
}

/// Recomputes the forecast for one product and appends it as a new
/// prediction row.
pub async fn recalculate(
    store: &dyn InventoryStore,
    product_id: Uuid,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> StoreResult<(Prediction, Forecast)> {
    let product = store.find_product(product_id).await?;
    let total_sold = window_total(store, product_id, config, now).await?;
    let forecast = forecast_from(product.inventory.quantity, total_sold, config, now);

    let prediction = store
        .insert_prediction(NewPrediction {
            product_id,
            predicted_demand: forecast.suggested_reorder_qty,
            forecast_date: now + chrono::Duration::days(config.forecast_days as i64),
        })
        .await?;

    Ok((prediction, forecast))
}

/// Current forecast without writing. `calculated_at` is the time of the most
/// recent stored prediction, if any.
pub async fn forecast(
    store: &dyn InventoryStore,
    product_id: Uuid,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> StoreResult<Forecast> {
    let product = store.find_product(product_id).await?;
    let total_sold = window_total(store, product_id, config, now).await?;
    let calculated_at = store
        .latest_prediction(product_id)
        .await?
        .map(|p| p.created_at)
        .unwrap_or(now);
    Ok(forecast_from(product.inventory.quantity, total_sold, config, calculated_at))
}

/// Handle for posting recompute jobs to the background worker.
#[derive(Clone)]
pub struct PredictionQueue {
    tx: mpsc::Sender<Uuid>,
}

impl PredictionQueue {
    /// Never blocks; a full or closed queue drops the job with a warning.
    pub fn post(&self, product_id: Uuid) {
        if let Err(e) = self.tx.try_send(product_id) {
            log::warn!("dropping prediction recompute for product {}: {}", product_id, e);
        }
    }
}

pub fn spawn_prediction_worker(
    store: Arc<dyn InventoryStore>,
    config: InsightConfig,
) -> (PredictionQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let handle = tokio::spawn(run_prediction_worker(rx, store, config));
    (PredictionQueue { tx }, handle)
}

/// Runs until every sender is dropped.
pub async fn run_prediction_worker(
    mut rx: mpsc::Receiver<Uuid>,
    store: Arc<dyn InventoryStore>,
    config: InsightConfig,
) {
    while let Some(product_id) = rx.recv().await {
        match recalculate(store.as_ref(), product_id, &config, Utc::now()).await {
            Ok((prediction, forecast)) => log::debug!(
                "prediction {} for product {}: demand {}, avg {}/day",
                prediction.id,
                product_id,
                prediction.predicted_demand,
                forecast.avg_daily_sales
            ),
            Err(e) => log::warn!("prediction recompute failed for product {}: {}", product_id, e),
        }
    }
}
