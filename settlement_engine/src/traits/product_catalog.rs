use crate::{
    db_types::{NewProduct, Product, ProductId},
    traits::OrderStoreError,
};

/// The dealership's catalog. The settlement flow only reads from it; the upsert exists so that the catalog can be
/// seeded.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog: Clone {
    /// Inserts the product, or replaces every attribute of an existing product with the same `product_id`.
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderStoreError>;

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderStoreError>;
}
