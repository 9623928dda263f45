use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub predicted_demand: i32,
    pub forecast_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub product_id: Uuid,
    pub predicted_demand: i32,
    pub forecast_date: DateTime<Utc>,
}

/// Velocity-based forecast for a single product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub avg_daily_sales: f64,
    /// `None` when the product has no recent sales.
    pub days_left: Option<f64>,
    pub suggested_reorder_qty: i32,
    pub calculated_at: DateTime<Utc>,
}
