//! Persistence boundary for the service.
//!
//! Handlers and services only see [`InventoryStore`]; the PostgreSQL
//! implementation backs production and the in-memory one backs tests and
//! local runs started with `STORAGE=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Inventory, NewPrediction, NewProduct, NewSale, NewStore, NewUser, Prediction, ProductPatch,
    ProductWithInventory, Sale, SaleReceipt, SalesRollup, Store, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Product not found in this store")]
    ProductNotInStore,
    #[error("{0}")]
    Conflict(String),
    /// Expected business outcome of a sale larger than the stock on hand.
    #[error("Insufficient stock. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: i32, requested: i32 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn rename_user(&self, id: Uuid, name: &str) -> StoreResult<User>;

    async fn create_store(&self, store: NewStore) -> StoreResult<Store>;
    async fn find_store(&self, id: Uuid) -> StoreResult<Store>;
    /// Stores owned by `owner_id`, oldest first.
    async fn list_stores(&self, owner_id: Uuid) -> StoreResult<Vec<Store>>;
    async fn rename_store(&self, id: Uuid, name: &str) -> StoreResult<Store>;
    async fn delete_store(&self, id: Uuid) -> StoreResult<()>;

    /// Creates the product and its inventory row atomically.
    async fn create_product(&self, product: NewProduct) -> StoreResult<ProductWithInventory>;
    async fn find_product(&self, id: Uuid) -> StoreResult<ProductWithInventory>;
    /// Products with inventory for a store, newest first.
    async fn list_products(&self, store_id: Uuid) -> StoreResult<Vec<ProductWithInventory>>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch)
        -> StoreResult<ProductWithInventory>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<()>;
    /// Absolute stock adjustment. Callers validate `quantity >= 0`.
    async fn set_stock(&self, product_id: Uuid, quantity: i32) -> StoreResult<Inventory>;

    /// Inserts the sale and decrements inventory in one transaction, refusing
    /// to go below zero.
    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleReceipt>;
    async fn list_sales_by_store(&self, store_id: Uuid) -> StoreResult<Vec<Sale>>;
    async fn list_sales_by_product(&self, product_id: Uuid) -> StoreResult<Vec<Sale>>;
    /// Totals for products with at least one sale at or after `since`.
    async fn sales_rollup(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesRollup>>;

    async fn insert_prediction(&self, prediction: NewPrediction) -> StoreResult<Prediction>;
    /// Most recent prediction per product, restricted to rows created at or after `since`.
    async fn latest_predictions(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Prediction>>;
    async fn latest_prediction(&self, product_id: Uuid) -> StoreResult<Option<Prediction>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
