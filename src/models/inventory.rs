use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::error::AppError;

pub const DEFAULT_UNIT: &str = "unit";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub product_id: Uuid,
    pub quantity: i32,
    pub reorder_point: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithInventory {
    #[serde(flatten)]
    pub product: Product,
    pub inventory: Inventory,
}

/// Flat row produced by the products/inventory join.
#[derive(Debug, FromRow)]
pub struct ProductInventoryRow {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub quantity: i32,
    pub reorder_point: i32,
    pub inventory_updated_at: DateTime<Utc>,
}

impl From<ProductInventoryRow> for ProductWithInventory {
    fn from(row: ProductInventoryRow) -> Self {
        Self {
            inventory: Inventory {
                product_id: row.id,
                quantity: row.quantity,
                reorder_point: row.reorder_point,
                updated_at: row.inventory_updated_at,
            },
            product: Product {
                id: row.id,
                store_id: row.store_id,
                name: row.name,
                sku: row.sku,
                unit: row.unit,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: Option<String>,
    pub store_id: Uuid,
    pub initial_stock: i32,
    pub reorder_point: i32,
    pub unit: Option<String>,
}

/// Product plus its initial inventory row, created together.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub store_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub initial_stock: i32,
    pub reorder_point: i32,
}

impl CreateProductRequest {
    pub fn into_new_product(self, now: DateTime<Utc>) -> Result<NewProduct, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Product name is required"));
        }
        if self.initial_stock < 0 {
            return Err(AppError::validation("Initial stock cannot be negative"));
        }
        if self.reorder_point < 0 {
            return Err(AppError::validation("Reorder point cannot be negative"));
        }

        let sku = self
            .sku
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("SKU-{}", now.timestamp_millis()));
        let unit = self
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        Ok(NewProduct {
            store_id: self.store_id,
            name,
            sku,
            unit,
            initial_stock: self.initial_stock,
            reorder_point: self.reorder_point,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(false);
        if blank(&self.name) {
            return Err(AppError::validation("Product name cannot be empty"));
        }
        if blank(&self.sku) {
            return Err(AppError::validation("SKU cannot be empty"));
        }
        if blank(&self.unit) {
            return Err(AppError::validation("Unit cannot be empty"));
        }
        Ok(())
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.trim().to_string();
        }
        if let Some(unit) = &self.unit {
            product.unit = unit.trim().to_string();
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: i32,
}

impl UpdateStockRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quantity < 0 {
            return Err(AppError::validation("Stock quantity cannot be negative"));
        }
        Ok(())
    }
}
