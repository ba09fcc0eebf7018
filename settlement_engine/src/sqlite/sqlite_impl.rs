//! `SqliteDatabase` is the concrete storefront backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`OrderStore`] and [`ProductCatalog`] traits.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{db_url, new_pool, orders, products};
use crate::{
    db_types::{NewOrder, NewProduct, Order, OrderDetails, OrderId, OrderLine, PaymentSettlement, Product, ProductId},
    traits::{OrderStore, OrderStoreError, ProductCatalog},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_id, order.id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_details(&self, order_id: &OrderId) -> Result<Option<OrderDetails>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_order_id(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = products::fetch_product(&item.product_id, &mut conn).await?;
            if product.is_none() {
                debug!("🗃️ Product {} on order {order_id} is no longer in the catalog", item.product_id);
            }
            lines.push(OrderLine { item, product: product.map(Into::into) });
        }
        Ok(Some(OrderDetails { order, lines }))
    }

    async fn fetch_unpaid_orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_unpaid_orders_for_email(email, &mut conn).await?;
        Ok(orders)
    }

    async fn try_mark_order_settled(
        &self,
        order_id: &OrderId,
        settlement: &PaymentSettlement,
    ) -> Result<Option<Order>, OrderStoreError> {
        // The write must be committed before the row is handed back, or a reader on another connection may still see
        // the unpaid order.
        let mut tx = self.pool.begin().await?;
        let order = orders::mark_order_settled(order_id, settlement, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let product = products::upsert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `DSF_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. The migrations are embedded in the binary.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
