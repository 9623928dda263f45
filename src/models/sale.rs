use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{error::AppError, models::Inventory};

/// Matches the `NUMERIC(12, 2)` column: two decimal places, under 10^10.
const AMOUNT_SCALE: u32 = 2;
const MAX_AMOUNT_EXCLUSIVE: i64 = 10_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    pub total_amount: Decimal,
}

impl NewSale {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        if self.total_amount < Decimal::ZERO {
            return Err(AppError::validation("Total amount cannot be negative"));
        }
        if self.total_amount.normalize().scale() > AMOUNT_SCALE {
            return Err(AppError::validation(
                "Total amount must have at most 2 decimal places",
            ));
        }
        if self.total_amount >= Decimal::from(MAX_AMOUNT_EXCLUSIVE) {
            return Err(AppError::validation("Total amount is too large"));
        }
        Ok(())
    }
}

/// Result of a committed sale: the sale row and the decremented inventory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    pub inventory: Inventory,
}

/// Per-product sales totals over a time window.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SalesRollup {
    pub product_id: Uuid,
    pub total_sold: i64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub store_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(quantity: i32, amount: Decimal) -> NewSale {
        NewSale {
            product_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            quantity,
            total_amount: amount,
        }
    }

    #[test]
    fn validates_quantity_and_amount() {
        assert!(sale(1, Decimal::ZERO).validate().is_ok());
        assert!(sale(0, Decimal::new(100, 2)).validate().is_err());
        assert!(sale(2, Decimal::new(-1, 2)).validate().is_err());
    }

    #[test]
    fn amount_must_fit_money_column() {
        // Trailing zeros beyond two places are fine.
        assert!(sale(1, Decimal::new(25000, 3)).validate().is_ok());
        assert!(sale(1, Decimal::new(12345, 3)).validate().is_err());

        assert!(sale(1, Decimal::new(999_999_999_999, 2)).validate().is_ok());
        assert!(sale(1, Decimal::new(1_000_000_000_000, 2)).validate().is_err());
    }

    #[test]
    fn accepts_numeric_amounts_from_json() {
        let body = serde_json::json!({
            "productId": Uuid::new_v4(),
            "storeId": Uuid::new_v4(),
            "quantity": 3,
            "totalAmount": 12.5
        });
        let parsed: NewSale = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.total_amount, Decimal::new(125, 1));
    }
}
