use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{InventoryStore, StoreError, StoreResult};
use crate::{
    database::Database,
    models::{
        Inventory, NewPrediction, NewProduct, NewSale, NewStore, NewUser, Prediction,
        ProductInventoryRow, ProductPatch, ProductWithInventory, Sale, SaleReceipt, SalesRollup,
        Store, User,
    },
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.store_id, p.name, p.sku, p.unit, p.created_at, p.updated_at,
           i.quantity, i.reorder_point, i.updated_at AS inventory_updated_at
    FROM products p
    JOIN inventory i ON i.product_id = p.id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: Database,
}

impl PgStore {
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }
}

fn unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "User with this email already exists"))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn rename_user(&self, id: Uuid, name: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn create_store(&self, store: NewStore) -> StoreResult<Store> {
        sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (id, name, slug, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&store.name)
        .bind(&store.slug)
        .bind(store.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "A store with this slug already exists"))
    }

    async fn find_store(&self, id: Uuid) -> StoreResult<Store> {
        sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Store"))
    }

    async fn list_stores(&self, owner_id: Uuid) -> StoreResult<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT * FROM stores WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    async fn rename_store(&self, id: Uuid, name: &str) -> StoreResult<Store> {
        sqlx::query_as::<_, Store>("UPDATE stores SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Store"))
    }

    async fn delete_store(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Store"));
        }
        Ok(())
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<ProductWithInventory> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, sku, unit)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(product.store_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.unit)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO inventory (product_id, quantity, reorder_point) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(product.initial_stock)
        .bind(product.reorder_point)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ProductInventoryRow>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<ProductWithInventory> {
        sqlx::query_as::<_, ProductInventoryRow>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Into::into)
            .ok_or(StoreError::NotFound("Product"))
    }

    async fn list_products(&self, store_id: Uuid) -> StoreResult<Vec<ProductWithInventory>> {
        let rows = sqlx::query_as::<_, ProductInventoryRow>(&format!(
            "{} WHERE p.store_id = $1 ORDER BY p.created_at DESC",
            PRODUCT_SELECT
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> StoreResult<ProductWithInventory> {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string());
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                unit = COALESCE($4, unit),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(trimmed(patch.name))
        .bind(trimmed(patch.sku))
        .bind(trimmed(patch.unit))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Product"));
        }
        self.find_product(id).await
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Product"));
        }
        Ok(())
    }

    async fn set_stock(&self, product_id: Uuid, quantity: i32) -> StoreResult<Inventory> {
        sqlx::query_as::<_, Inventory>(
            r#"
            UPDATE inventory SET quantity = $2, updated_at = NOW()
            WHERE product_id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Inventory"))
    }

    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleReceipt> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the inventory serializes concurrent sales of one product.
        let current: Option<(Uuid, i32)> = sqlx::query_as(
            r#"
            SELECT p.store_id, i.quantity
            FROM products p
            JOIN inventory i ON i.product_id = p.id
            WHERE p.id = $1
            FOR UPDATE OF i
            "#,
        )
        .bind(sale.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (store_id, available) = current.ok_or(StoreError::NotFound("Product"))?;
        if store_id != sale.store_id {
            return Err(StoreError::ProductNotInStore);
        }
        if available < sale.quantity {
            return Err(StoreError::InsufficientStock {
                available,
                requested: sale.quantity,
            });
        }

        let recorded = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (id, store_id, product_id, quantity, total_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sale.store_id)
        .bind(sale.product_id)
        .bind(sale.quantity)
        .bind(sale.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        let inventory = sqlx::query_as::<_, Inventory>(
            r#"
            UPDATE inventory SET quantity = quantity - $2, updated_at = NOW()
            WHERE product_id = $1
            RETURNING *
            "#,
        )
        .bind(sale.product_id)
        .bind(sale.quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SaleReceipt { sale: recorded, inventory })
    }

    async fn list_sales_by_store(&self, store_id: Uuid) -> StoreResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE store_id = $1 ORDER BY sold_at DESC",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    async fn list_sales_by_product(&self, product_id: Uuid) -> StoreResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE product_id = $1 ORDER BY sold_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    async fn sales_rollup(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesRollup>> {
        let rollups = sqlx::query_as::<_, SalesRollup>(
            r#"
            SELECT product_id,
                   SUM(quantity)::BIGINT AS total_sold,
                   MAX(sold_at) AS last_sale_at
            FROM sales
            WHERE product_id = ANY($1) AND sold_at >= $2
            GROUP BY product_id
            "#,
        )
        .bind(product_ids)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rollups)
    }

    async fn insert_prediction(&self, prediction: NewPrediction) -> StoreResult<Prediction> {
        let row = sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions (id, product_id, predicted_demand, forecast_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(prediction.product_id)
        .bind(prediction.predicted_demand)
        .bind(prediction.forecast_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn latest_predictions(
        &self,
        product_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Prediction>> {
        let rows = sqlx::query_as::<_, Prediction>(
            r#"
            SELECT DISTINCT ON (product_id) *
            FROM predictions
            WHERE product_id = ANY($1) AND created_at >= $2
            ORDER BY product_id, created_at DESC
            "#,
        )
        .bind(product_ids)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_prediction(&self, product_id: Uuid) -> StoreResult<Option<Prediction>> {
        let row = sqlx::query_as::<_, Prediction>(
            "SELECT * FROM predictions WHERE product_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
