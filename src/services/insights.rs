//! Dashboard aggregation: per-product sales velocity and the four derived
//! lists (low stock, reorder suggestions, dead stock, fast movers).
//!
//! [`build_dashboard`] is pure over its inputs; [`load_dashboard`] fetches
//! those inputs from an [`InventoryStore`].

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::InsightConfig,
    models::{Prediction, ProductWithInventory, SalesRollup},
    store::{InventoryStore, StoreResult},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_products: usize,
    pub total_stock: i64,
    pub low_stock_count: usize,
    pub dead_stock_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LowStockReason {
    #[serde(rename = "Below reorder point")]
    BelowReorderPoint,
    #[serde(rename = "Low days left")]
    LowDaysLeft,
    #[serde(rename = "Below reorder point and low days left")]
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub current_stock: i32,
    pub reorder_point: i32,
    pub days_left: Option<f64>,
    pub reason: LowStockReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSuggestion {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub current_stock: i32,
    pub avg_daily_sales: f64,
    pub days_left: Option<f64>,
    pub suggested_reorder_qty: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadStockItem {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub current_stock: i32,
    /// Lower bound: the product has not sold for at least the whole window.
    pub days_since_last_sale: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FastMovingItem {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub current_stock: i32,
    pub avg_daily_sales: f64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub summary: DashboardSummary,
    pub low_stock_items: Vec<LowStockItem>,
    pub reorder_suggestions: Vec<ReorderSuggestion>,
    pub dead_stock_items: Vec<DeadStockItem>,
    pub fast_moving_items: Vec<FastMovingItem>,
}

/// Derived numbers for one product over the trailing window.
#[derive(Debug, Clone)]
pub struct ProductMetrics<'a> {
    pub product: &'a ProductWithInventory,
    pub total_sold: i64,
    pub last_sale_at: Option<DateTime<Utc>>,
    pub avg_daily_sales: f64,
    pub days_left: Option<f64>,
    pub predicted_demand: Option<i32>,
}

impl<'a> ProductMetrics<'a> {
    pub fn new(
        product: &'a ProductWithInventory,
        rollup: Option<&SalesRollup>,
        prediction: Option<&Prediction>,
        config: &InsightConfig,
    ) -> Self {
        let total_sold = rollup.map(|r| r.total_sold).unwrap_or(0);
        let avg_daily_sales = average_daily_sales(total_sold, config);
        Self {
            product,
            total_sold,
            last_sale_at: rollup.and_then(|r| r.last_sale_at),
            avg_daily_sales,
            days_left: days_left(product.inventory.quantity, avg_daily_sales),
            predicted_demand: prediction.map(|p| p.predicted_demand),
        }
    }

    fn stock(&self) -> i32 {
        self.product.inventory.quantity
    }

    pub fn low_stock_reason(&self, config: &InsightConfig) -> Option<LowStockReason> {
        let at_reorder_point = self.stock() <= self.product.inventory.reorder_point;
        let low_days_left = self.days_left.map_or(false, |d| d <= config.low_days_left);
        match (at_reorder_point, low_days_left) {
            (true, true) => Some(LowStockReason::Both),
            (true, false) => Some(LowStockReason::BelowReorderPoint),
            (false, true) => Some(LowStockReason::LowDaysLeft),
            (false, false) => None,
        }
    }

    pub fn is_dead_stock(&self) -> bool {
        self.total_sold == 0 && self.stock() > 0
    }

    pub fn is_fast_moving(&self, config: &InsightConfig) -> bool {
        self.avg_daily_sales >= config.fast_moving_per_day
    }

    /// Cached prediction if one exists, else projected demand plus buffer.
    pub fn reorder_quantity(&self, config: &InsightConfig) -> i32 {
        self.predicted_demand
            .unwrap_or_else(|| config.reorder_quantity(self.avg_daily_sales))
    }
}

pub fn average_daily_sales(total_sold: i64, config: &InsightConfig) -> f64 {
    total_sold as f64 / config.window_days as f64
}

pub fn days_left(stock: i32, avg_daily_sales: f64) -> Option<f64> {
    (avg_daily_sales > 0.0).then(|| stock as f64 / avg_daily_sales)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Ascending, with `None` after every known value.
fn compare_days_left(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY).total_cmp(&b.unwrap_or(f64::INFINITY))
}

pub fn build_dashboard(
    products: &[ProductWithInventory],
    rollups: &[SalesRollup],
    predictions: &[Prediction],
    config: &InsightConfig,
) -> DashboardData {
    if products.is_empty() {
        return DashboardData::default();
    }

    let rollups: HashMap<Uuid, &SalesRollup> =
        rollups.iter().map(|r| (r.product_id, r)).collect();
    let predictions: HashMap<Uuid, &Prediction> =
        predictions.iter().map(|p| (p.product_id, p)).collect();

    let metrics: Vec<ProductMetrics> = products
        .iter()
        .map(|p| {
            let id = p.product.id;
            ProductMetrics::new(
                p,
                rollups.get(&id).copied(),
                predictions.get(&id).copied(),
                config,
            )
        })
        .collect();

    let mut low: Vec<(&ProductMetrics, LowStockReason)> = metrics
        .iter()
        .filter_map(|m| m.low_stock_reason(config).map(|reason| (m, reason)))
        .collect();
    low.sort_by(|(a, _), (b, _)| compare_days_left(a.days_left, b.days_left));

    let mut dead: Vec<&ProductMetrics> = metrics.iter().filter(|m| m.is_dead_stock()).collect();
    dead.sort_by(|a, b| b.stock().cmp(&a.stock()));

    let mut fast: Vec<&ProductMetrics> =
        metrics.iter().filter(|m| m.is_fast_moving(config)).collect();
    fast.sort_by(|a, b| b.avg_daily_sales.total_cmp(&a.avg_daily_sales));

    let summary = DashboardSummary {
        total_products: metrics.len(),
        total_stock: metrics.iter().map(|m| m.stock() as i64).sum(),
        low_stock_count: low.len(),
        dead_stock_count: dead.len(),
    };

    let low_stock_items = low
        .iter()
        .map(|(m, reason)| LowStockItem {
            product_id: m.product.product.id,
            name: m.product.product.name.clone(),
            sku: m.product.product.sku.clone(),
            current_stock: m.stock(),
            reorder_point: m.product.inventory.reorder_point,
            days_left: m.days_left.map(|d| round_to(d, 1)),
            reason: *reason,
        })
        .collect();

    let reorder_suggestions = low
        .iter()
        .map(|(m, _)| ReorderSuggestion {
            product_id: m.product.product.id,
            name: m.product.product.name.clone(),
            sku: m.product.product.sku.clone(),
            current_stock: m.stock(),
            avg_daily_sales: round_to(m.avg_daily_sales, 2),
            days_left: m.days_left.map(|d| round_to(d, 1)),
            suggested_reorder_qty: m.reorder_quantity(config),
        })
        .collect();

    let dead_stock_items = dead
        .iter()
        .map(|m| DeadStockItem {
            product_id: m.product.product.id,
            name: m.product.product.name.clone(),
            sku: m.product.product.sku.clone(),
            current_stock: m.stock(),
            days_since_last_sale: config.window_days,
        })
        .collect();

    let fast_moving_items = fast
        .iter()
        .map(|m| FastMovingItem {
            product_id: m.product.product.id,
            name: m.product.product.name.clone(),
            sku: m.product.product.sku.clone(),
            current_stock: m.stock(),
            avg_daily_sales: round_to(m.avg_daily_sales, 2),
            last_sale_at: m.last_sale_at,
        })
        .collect();

    DashboardData {
        summary,
        low_stock_items,
        reorder_suggestions,
        dead_stock_items,
        fast_moving_items,
    }
}

/// Loads a store's products, window sales and cached predictions, then
/// aggregates them. Fails with `NotFound` for an unknown store.
pub async fn load_dashboard(
    store: &dyn InventoryStore,
    store_id: Uuid,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> StoreResult<DashboardData> {
    store.find_store(store_id).await?;

    let products = store.list_products(store_id).await?;
    if products.is_empty() {
        return Ok(DashboardData::default());
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.product.id).collect();
    let since = now - config.window();
    let rollups = store.sales_rollup(&ids, since).await?;
    let predictions = store.latest_predictions(&ids, since).await?;

    log::debug!(
        "aggregating dashboard for store {}: {} products, {} with recent sales",
        store_id,
        products.len(),
        rollups.len()
    );

    Ok(build_dashboard(&products, &rollups, &predictions, config))
}
