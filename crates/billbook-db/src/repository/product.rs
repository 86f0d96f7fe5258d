//! # Product Repository
//!
//! `ProductStore` over the `products` table.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                              │
//! │    SELECT quantity FROM products WHERE id = ?    (None → NotFound)  │
//! │    new = max(0, quantity - amount)                                  │
//! │    status = derive_status(new)                                      │
//! │    UPDATE products SET quantity = new, status = status ...          │
//! │  COMMIT                                                             │
//! │                                                                     │
//! │  The status is computed in Rust, never in SQL, so every backend    │
//! │  shares one definition of "out of stock".                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use billbook_core::validation::validate_new_product;
use billbook_core::{
    derive_status, now_millis, CoreError, CoreResult, Money, NewProduct, Product, ProductId,
    ProductStore, StockStatus, StorageError, ValidationError,
};

use super::{decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};

const ENTITY: &str = "Product";

const COLUMNS: &str = "id, category, title, purchase_price_cents, selling_price_cents, \
                       quantity, status, created_at";

// =============================================================================
// Row Decoding
// =============================================================================

/// A `products` row exactly as stored.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    category: String,
    title: String,
    purchase_price_cents: i64,
    selling_price_cents: i64,
    quantity: i64,
    status: String,
    created_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StorageError::corrupt(ENTITY, format!("id {}: {reason}", row.id));

        if row.quantity < 0 {
            return Err(corrupt(format!("negative quantity {}", row.quantity)));
        }

        let status = match row.status.as_str() {
            "in_stock" => StockStatus::InStock,
            "out_of_stock" => StockStatus::OutOfStock,
            other => return Err(corrupt(format!("unknown status '{other}'"))),
        };
        if status != derive_status(row.quantity) {
            return Err(corrupt(format!(
                "status '{}' does not match quantity {}",
                row.status, row.quantity
            )));
        }

        let created_at = decode_timestamp(ENTITY, &row.created_at)?;

        Ok(Product {
            id: row.id,
            category: row.category,
            title: row.title,
            purchase_price: Money::from_cents(row.purchase_price_cents),
            selling_price: Money::from_cents(row.selling_price_cents),
            quantity: row.quantity,
            status,
            created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let pen = repo.create(new_pen).await?;
/// let pen = repo.decrement_quantity(pen.id, 3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Inserts a product keeping its id and createdAt. Used by snapshot import.
pub(crate) async fn insert_with_id(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, category, title, purchase_price_cents, selling_price_cents,
            quantity, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(product.id)
    .bind(&product.category)
    .bind(&product.title)
    .bind(product.purchase_price.cents())
    .bind(product.selling_price.cents())
    .bind(product.quantity)
    .bind(derive_status(product.quantity))
    .bind(encode_timestamp(product.created_at))
    .execute(conn)
    .await?;
    Ok(())
}

/// Reads every product. Shared with snapshot export.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> CoreResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM products ORDER BY id"))
        .fetch_all(conn)
        .await
        .map_err(DbError::from)?;

    let products = rows
        .into_iter()
        .map(Product::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(products)
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list(&self) -> CoreResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let products = fetch_all(&mut conn).await?;
        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;

        Ok(row.map(Product::try_from).transpose()?)
    }

    async fn create(&self, input: NewProduct) -> CoreResult<Product> {
        let input = validate_new_product(input)?;
        let status = derive_status(input.quantity);
        let created_at = now_millis();

        debug!(title = %input.title, quantity = input.quantity, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                category, title, purchase_price_cents, selling_price_cents,
                quantity, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&input.category)
        .bind(&input.title)
        .bind(input.purchase_price.cents())
        .bind(input.selling_price.cents())
        .bind(input.quantity)
        .bind(status)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(Product {
            id: result.last_insert_rowid(),
            category: input.category,
            title: input.title,
            purchase_price: input.purchase_price,
            selling_price: input.selling_price,
            quantity: input.quantity,
            status,
            created_at,
        })
    }

    async fn update(&self, product: Product) -> CoreResult<Product> {
        let input = validate_new_product(NewProduct::from(&product))?;

        debug!(id = product.id, "Updating product");

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r#"
            UPDATE products SET
                category = ?2,
                title = ?3,
                purchase_price_cents = ?4,
                selling_price_cents = ?5,
                quantity = ?6,
                status = ?7
            WHERE id = ?1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&input.category)
        .bind(&input.title)
        .bind(input.purchase_price.cents())
        .bind(input.selling_price.cents())
        .bind(input.quantity)
        .bind(derive_status(input.quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        match row {
            Some(row) => Ok(Product::try_from(row)?),
            None => Err(CoreError::ProductNotFound(product.id)),
        }
    }

    async fn decrement_quantity(&self, id: ProductId, amount: i64) -> CoreResult<Product> {
        if amount < 0 {
            return Err(ValidationError::Negative {
                field: "amount".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let Some(current) = current else {
            return Err(CoreError::ProductNotFound(id));
        };

        let remaining = current.saturating_sub(amount).max(0);

        let row: ProductRow = sqlx::query_as(&format!(
            "UPDATE products SET quantity = ?2, status = ?3 WHERE id = ?1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(remaining)
        .bind(derive_status(remaining))
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        debug!(id, amount, remaining, "Decremented stock");
        Ok(Product::try_from(row)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
