use crate::{
    models::{NewSale, SaleReceipt},
    store::{InventoryStore, StoreResult},
};

use super::{cache::DashboardCache, predictions::PredictionQueue};

/// Records a validated sale, then invalidates the store's cached dashboard and
/// queues a prediction recompute for the product. The recompute runs after
/// the sale is committed and its outcome never reaches the caller.
pub async fn record_sale(
    store: &dyn InventoryStore,
    cache: &DashboardCache,
    predictions: &PredictionQueue,
    sale: NewSale,
) -> StoreResult<SaleReceipt> {
    let receipt = store.record_sale(sale).await?;

    log::info!(
        "sale {} recorded: {} x product {}, stock now {}",
        receipt.sale.id,
        receipt.sale.quantity,
        receipt.sale.product_id,
        receipt.inventory.quantity
    );

    cache.invalidate(receipt.sale.store_id).await;
    predictions.post(receipt.sale.product_id);

    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::InsightConfig,
        models::{NewProduct, NewStore, NewUser},
        services::{insights::DashboardData, predictions::spawn_prediction_worker},
        store::{MemoryStore, StoreError},
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        cache: DashboardCache,
        queue: PredictionQueue,
        shop_id: Uuid,
        product_id: Uuid,
    }

    async fn fixture(stock: i32) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let owner = store
            .create_user(NewUser {
                email: "s@shop.test".into(),
                name: "S".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let shop = store
            .create_store(NewStore::new("Corner", owner.id, Utc::now()))
            .await
            .unwrap();
        let product = store
            .create_product(NewProduct {
                store_id: shop.id,
                name: "Rice".into(),
                sku: "RICE-1".into(),
                unit: "bag".into(),
                initial_stock: stock,
                reorder_point: 2,
            })
            .await
            .unwrap();
        let (queue, _worker) = spawn_prediction_worker(store.clone(), InsightConfig::default());
        Fixture {
            store,
            cache: DashboardCache::new(Duration::from_secs(60)),
            queue,
            shop_id: shop.id,
            product_id: product.product.id,
        }
    }

    fn sale(f: &Fixture, quantity: i32) -> NewSale {
        NewSale {
            product_id: f.product_id,
            store_id: f.shop_id,
            quantity,
            total_amount: Decimal::new(quantity as i64 * 250, 2),
        }
    }

    #[tokio::test]
    async fn selling_entire_stock_leaves_zero() {
        let f = fixture(12).await;
        let receipt = record_sale(f.store.as_ref(), &f.cache, &f.queue, sale(&f, 12))
            .await
            .unwrap();
        assert_eq!(receipt.inventory.quantity, 0);
        assert_eq!(receipt.sale.total_amount, Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn overselling_is_refused_without_side_effects() {
        let f = fixture(12).await;
        let err = record_sale(f.store.as_ref(), &f.cache, &f.queue, sale(&f, 13))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                available: 12,
                requested: 13
            }
        ));

        let product = f.store.find_product(f.product_id).await.unwrap();
        assert_eq!(product.inventory.quantity, 12);
        assert!(f.store.list_sales_by_product(f.product_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sale_invalidates_cached_dashboard() {
        let f = fixture(5).await;
        f.cache.insert(f.shop_id, DashboardData::default()).await;

        record_sale(f.store.as_ref(), &f.cache, &f.queue, sale(&f, 1))
            .await
            .unwrap();

        assert!(f.cache.get(f.shop_id).await.is_none());
    }

    #[tokio::test]
    async fn failed_sale_keeps_cached_dashboard() {
        let f = fixture(1).await;
        f.cache.insert(f.shop_id, DashboardData::default()).await;

        let mut wrong_store = sale(&f, 1);
        wrong_store.store_id = Uuid::new_v4();
        let err = record_sale(f.store.as_ref(), &f.cache, &f.queue, wrong_store)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ProductNotInStore));
        assert!(f.cache.get(f.shop_id).await.is_some());
    }
}
