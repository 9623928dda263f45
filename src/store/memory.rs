//! In-memory implementation of [`InventoryStore`].
//!
//! All state sits behind one `tokio::sync::RwLock`, so every mutation is
//! serialized. That makes `record_sale` trivially atomic: the stock check, the
//! sale insert and the decrement happen under a single write guard. Nothing is
//! durable; the store is meant for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InventoryStore, StoreError, StoreResult};
use crate::models::{
    Inventory, NewPrediction, NewProduct, NewSale, NewStore, NewUser, Prediction, Product,
    ProductPatch, ProductWithInventory, Sale, SaleReceipt, SalesRollup, Store, User,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    stores: HashMap<Uuid, Store>,
    products: HashMap<Uuid, Product>,
    inventory: HashMap<Uuid, Inventory>,
    sales: Vec<Sale>,
    predictions: Vec<Prediction>,
}

impl State {
    fn product_with_inventory(&self, id: Uuid) -> StoreResult<ProductWithInventory> {
        let product = self.products.get(&id).ok_or(StoreError::NotFound("Product"))?;
        let inventory = self.inventory.get(&id).ok_or(StoreError::NotFound("Inventory"))?;
        Ok(ProductWithInventory {
            product: product.clone(),
            inventory: inventory.clone(),
        })
    }

    fn remove_product(&mut self, id: Uuid) {
        self.products.remove(&id);
        self.inventory.remove(&id);
        self.sales.retain(|s| s.product_id != id);
        self.predictions.retain(|p| p.product_id != id);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sale with an explicit timestamp, leaving inventory untouched.
    #[cfg(test)]
    pub async fn backfill_sale(&self, sale: NewSale, sold_at: DateTime<Utc>) -> Sale {
        let row = Sale {
            id: Uuid::new_v4(),
            store_id: sale.store_id,
            product_id: sale.product_id,
            quantity: sale.quantity,
            total_amount: sale.total_amount,
            sold_at,
        };
        self.state.write().await.sales.push(row.clone());
        row
    }

    /// Inserts a prediction with an explicit creation time.
    #[cfg(test)]
    pub async fn backfill_prediction(
        &self,
        prediction: NewPrediction,
        created_at: DateTime<Utc>,
    ) -> Prediction {
        let row = Prediction {
            id: Uuid::new_v4(),
            product_id: prediction.product_id,
            predicted_demand: prediction.predicted_demand,
            forecast_date: prediction.forecast_date,
            created_at,
        };
        self.state.write().await.predictions.push(row.clone());
        row
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            role: "owner".to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn rename_user(&self, id: Uuid, name: &str) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn create_store(&self, store: NewStore) -> StoreResult<Store> {
        let mut state = self.state.write().await;
        if state.stores.values().any(|s| s.slug == store.slug) {
            return Err(StoreError::Conflict(
                "A store with this slug already exists".to_string(),
            ));
        }
        let row = Store {
            id: Uuid::new_v4(),
            name: store.name,
            slug: store.slug,
            owner_id: store.owner_id,
            created_at: Utc::now(),
        };
        state.stores.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_store(&self, id: Uuid) -> StoreResult<Store> {
        self.state
            .read()
            .await
            .stores
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Store"))
    }

    async fn list_stores(&self, owner_id: Uuid) -> StoreResult<Vec<Store>> {
        let state = self.state.read().await;
        let mut stores: Vec<Store> = state
            .stores
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        stores.sort_by_key(|s| s.created_at);
        Ok(stores)
    }

    async fn rename_store(&self, id: Uuid, name: &str) -> StoreResult<Store> {
        let mut state = self.state.write().await;
        let store = state.stores.get_mut(&id).ok_or(StoreError::NotFound("Store"))?;
        store.name = name.to_string();
        Ok(store.clone())
    }

    async fn delete_store(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.stores.remove(&id).is_none() {
            return Err(StoreError::NotFound("Store"));
        }
        let product_ids: Vec<Uuid> = state
            .products
            .values()
            .filter(|p| p.store_id == id)
            .map(|p| p.id)
            .collect();
        for product_id in product_ids {
            state.remove_product(product_id);
        }
        state.sales.retain(|s| s.store_id != id);
        Ok(())
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<ProductWithInventory> {
        let mut state = self.state.write().await;
        if !state.stores.contains_key(&product.store_id) {
            return Err(StoreError::NotFound("Store"));
        }
        let now = Utc::now();
        let row = Product {
            id: Uuid::new_v4(),
            store_id: product.store_id,
            name: product.name,
            sku: product.sku,
            unit: product.unit,
            created_at: now,
            updated_at: now,
        };
        let inventory = Inventory {
            product_id: row.id,
            quantity: product.initial_stock,
            reorder_point: product.reorder_point,
            updated_at: now,
        };
        state.inventory.insert(row.id, inventory.clone());
        state.products.insert(row.id, row.clone());
        Ok(ProductWithInventory { product: row, inventory })
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<ProductWithInventory> {
        self.state.read().await.product_with_inventory(id)
    }

    async fn list_products(&self, store_id: Uuid) -> StoreResult<Vec<ProductWithInventory>> {
        let state = self.state.read().await;
        let mut products: Vec<ProductWithInventory> = state
            .products
            .values()
            .filter(|p| p.store_id == store_id)
            .filter_map(|p| {
                state.inventory.get(&p.id).map(|inventory| ProductWithInventory {
                    product: p.clone(),
                    inventory: inventory.clone(),
                })
            })
            .collect();
        products.sort_by(|a, b| b.product.created_at.cmp(&a.product.created_at));
        Ok(products)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> StoreResult<ProductWithInventory> {
        let mut state = self.state.write().await;
        let product = state.products.get_mut(&id).ok_or(StoreError::NotFound("Product"))?;
        patch.apply(product);
        product.updated_at = Utc::now();
        state.product_with_inventory(id)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound("Product"));
        }
        state.remove_product(id);
        Ok(())
    }

    async fn set_stock(&self, product_id: Uuid, quantity: i32) -> StoreResult<Inventory> {
        let mut state = self.state.write().await;
        let inventory = state
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::NotFound("Inventory"))?;
        inventory.quantity = quantity;
        inventory.updated_at = Utc::now();
        Ok(inventory.clone())
    }

    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleReceipt> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get(&sale.product_id)
            .ok_or(StoreError::NotFound("Product"))?;
        if product.store_id != sale.store_id {
            return Err(StoreError::ProductNotInStore);
        }

        let now = Utc::now();
        let inventory = state
            .inventory
            .get_mut(&sale.product_id)
            .ok_or(StoreError::NotFound("Inventory"))?;
        if inventory.quantity < sale.quantity {
            return Err(StoreError::InsufficientStock {
                available: inventory.quantity,
                requested: sale.quantity,
            });
        }
        inventory.quantity -= sale.quantity;
        inventory.updated_at = now;
        let inventory = inventory.clone();

        let row = Sale {
            id: Uuid::new_v4(),
            store_id: sale.store_id,
            product_id: sale.product_id,
            quantity: sale.quantity,
            total_amount: sale.total_amount,
            sold_at: now,
        };
        state.sales.push(row.clone());

        Ok(SaleReceipt { sale: row, inventory })
    }

    async fn list_sales_by_store(&self, store_id: Uuid) -> StoreResult<Vec<Sale>> {
        let state = self.state.read().await;
        let mut sales: Vec<Sale> = state
            .sales
            .iter()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        Ok(sales)
    }

    async fn list_sales_by_product(&self, product_id: Uuid) -> StoreResult<Vec<Sale>> {
        let state = self.state.read().await;
        let mut sales: Vec<Sale> = state
            .sales
            .iter()
            .filter(|s| s.product_id == product_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        Ok(sales)
    }

    async fn sales_rollup(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesRollup>> {
        let state = self.state.read().await;
        let mut rollups: HashMap<Uuid, SalesRollup> = HashMap::new();
        for sale in state
            .sales
            .iter()
            .filter(|s| s.sold_at >= since && product_ids.contains(&s.product_id))
        {
            let entry = rollups.entry(sale.product_id).or_insert(SalesRollup {
                product_id: sale.product_id,
                total_sold: 0,
                last_sale_at: None,
            });
            entry.total_sold += sale.quantity as i64;
            entry.last_sale_at = entry.last_sale_at.max(Some(sale.sold_at));
        }
        Ok(rollups.into_values().collect())
    }

    async fn insert_prediction(&self, prediction: NewPrediction) -> StoreResult<Prediction> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&prediction.product_id) {
            return Err(StoreError::NotFound("Product"));
        }
        let row = Prediction {
            id: Uuid::new_v4(),
            product_id: prediction.product_id,
            predicted_demand: prediction.predicted_demand,
            forecast_date: prediction.forecast_date,
            created_at: Utc::now(),
        };
        state.predictions.push(row.clone());
        Ok(row)
    }

    async fn latest_predictions(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        let mut latest: HashMap<Uuid, &Prediction> = HashMap::new();
        for prediction in state
            .predictions
            .iter()
            .filter(|p| p.created_at >= since && product_ids.contains(&p.product_id))
        {
            match latest.get(&prediction.product_id) {
                Some(current) if current.created_at >= prediction.created_at => {}
                _ => {
                    latest.insert(prediction.product_id, prediction);
                }
            }
        }
        Ok(latest.into_values().cloned().collect())
    }

    async fn latest_prediction(&self, product_id: Uuid) -> StoreResult<Option<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.product_id == product_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
