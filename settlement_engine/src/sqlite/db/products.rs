use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewProduct, Product, ProductId};

/// Inserts the product, or overwrites the attributes of the product with the same `product_id`.
pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (product_id, title, make, model, year, color, mileage, fuel_type, price, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (product_id) DO UPDATE SET
                title = excluded.title,
                make = excluded.make,
                model = excluded.model,
                year = excluded.year,
                color = excluded.color,
                mileage = excluded.mileage,
                fuel_type = excluded.fuel_type,
                price = excluded.price,
                images = excluded.images,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(product.product_id.as_str())
    .bind(product.title)
    .bind(product.make)
    .bind(product.model)
    .bind(product.year)
    .bind(product.color)
    .bind(product.mileage)
    .bind(product.fuel_type)
    .bind(product.price.value())
    .bind(Json(product.images))
    .fetch_one(conn)
    .await?;
    debug!("📝️ Product {} saved", product.product_id);
    Ok(product)
}

pub async fn fetch_product(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE product_id = $1")
        .bind(product_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(product)
}
