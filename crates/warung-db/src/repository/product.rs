//! # Product Repository
//!
//! Database operations for menu products and their bills of materials.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  A Product spans two tables:                                        │
//! │                                                                     │
//! │  products                  product_bom                              │
//! │  ┌──────────────┐          ┌──────────────────────┐                 │
//! │  │ id           │◄─────────│ product_id (FK)      │                 │
//! │  │ name         │          │ material_id          │  ← NO FK to     │
//! │  │ price        │          │ qty                  │    materials,   │
//! │  │ is_active    │          └──────────────────────┘    on purpose   │
//! │  └──────────────┘                                                   │
//! │                                                                     │
//! │  BOM rows are replaced wholesale on update (delete + reinsert       │
//! │  inside one transaction). Simpler than diffing, and a BOM rarely    │
//! │  has more than a handful of lines.                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use warung_core::validation::{validate_bom_qty, validate_name, validate_price};
use warung_core::{BomLine, Product};

/// Flat row from the `products` table, before BOM assembly.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: Option<String>,
    price: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, bom: Vec<BomLine>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            category: self.category,
            price: self.price,
            bom,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// BOM row including its owning product, for grouped list queries.
#[derive(Debug, sqlx::FromRow)]
struct BomRow {
    product_id: String,
    material_id: String,
    qty: i64,
}

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a new product with its BOM.
    ///
    /// The product row and all BOM rows are written in one transaction,
    /// so a product is never observable with half a recipe. Name, price
    /// and every BOM quantity are validated first; a product with a
    /// non-positive price must never reach the menu.
    pub async fn insert(
        &self,
        name: &str,
        category: Option<&str>,
        price: i64,
        bom: &[BomLine],
    ) -> DbResult<Product> {
        validate_name(name)?;
        validate_price(price)?;
        for line in bom {
            validate_bom_qty(line.qty)?;
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            category: category.map(|c| c.trim().to_string()),
            price,
            bom: bom.to_vec(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &product.bom {
            sqlx::query(
                r#"
                INSERT INTO product_bom (product_id, material_id, qty)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(&product.id)
            .bind(&line.material_id)
            .bind(line.qty)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(product)
    }

    /// Updates a product's details and replaces its BOM.
    ///
    /// Same validation as [`insert`](Self::insert); nothing is touched
    /// when any field fails.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        category: Option<&str>,
        price: i64,
        bom: &[BomLine],
    ) -> DbResult<()> {
        validate_name(name)?;
        validate_price(price)?;
        for line in bom {
            validate_bom_qty(line.qty)?;
        }

        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                price = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(category.map(str::trim))
        .bind(price)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        // Replace the BOM wholesale
        sqlx::query("DELETE FROM product_bom WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for line in bom {
            sqlx::query(
                r#"
                INSERT INTO product_bom (product_id, material_id, qty)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(id)
            .bind(&line.material_id)
            .bind(line.qty)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Gets a product by its ID, BOM included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, category, price, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let bom = sqlx::query_as::<_, BomLine>(
            r#"
            SELECT material_id, qty
            FROM product_bom
            WHERE product_id = ?1
            ORDER BY material_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_product(bom)))
    }

    /// Lists all products (active and inactive), ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        self.list_where("").await
    }

    /// Lists active products only - the sale flow's menu.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        self.list_where("WHERE is_active = 1").await
    }

    async fn list_where(&self, filter: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT id, name, category, price, is_active, created_at, updated_at
            FROM products
            {}
            ORDER BY name
            "#,
            filter
        ))
        .fetch_all(&self.pool)
        .await?;

        // One grouped BOM fetch instead of a query per product
        let bom_rows = sqlx::query_as::<_, BomRow>(
            r#"
            SELECT product_id, material_id, qty
            FROM product_bom
            ORDER BY product_id, material_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut boms: std::collections::HashMap<String, Vec<BomLine>> =
            std::collections::HashMap::new();
        for bom_row in bom_rows {
            boms.entry(bom_row.product_id).or_default().push(BomLine {
                material_id: bom_row.material_id,
                qty: bom_row.qty,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let bom = boms.remove(&row.id).unwrap_or_default();
                row.into_product(bom)
            })
            .collect())
    }

    /// Sets a product's active flag.
    ///
    /// Deactivating hides the product from the sale flow; its historical
    /// sale records are untouched.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product. BOM rows cascade via the foreign key.
    ///
    /// Sale records referencing this product survive - they carry their
    /// own name/price snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use warung_core::BomLine;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn bom(lines: &[(&str, i64)]) -> Vec<BomLine> {
        lines
            .iter()
            .map(|(id, qty)| BomLine {
                material_id: id.to_string(),
                qty: *qty,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_insert_and_get_with_bom() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert(
                "Kopi Susu",
                Some("minuman"),
                18_000,
                &bom(&[("m-kopi", 20), ("m-susu", 100)]),
            )
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Kopi Susu");
        assert_eq!(fetched.price, 18_000);
        assert_eq!(fetched.bom.len(), 2);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_update_replaces_bom() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert("Es Teh", None, 5_000, &bom(&[("m-teh", 5), ("m-gula", 15)]))
            .await
            .unwrap();

        repo.update(
            &created.id,
            "Es Teh Manis",
            Some("minuman"),
            6_000,
            &bom(&[("m-teh", 5)]),
        )
        .await
        .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Es Teh Manis");
        assert_eq!(fetched.price, 6_000);
        assert_eq!(fetched.bom.len(), 1);
        assert_eq!(fetched.bom[0].material_id, "m-teh");
    }

    #[tokio::test]
    async fn test_list_active_excludes_deactivated() {
        let db = test_db().await;
        let repo = db.products();

        let a = repo.insert("Nasi Goreng", None, 20_000, &[]).await.unwrap();
        repo.insert("Mie Goreng", None, 18_000, &[]).await.unwrap();

        repo.set_active(&a.id, false).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Mie Goreng");

        // Full list still shows both
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_bom() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert("Teh Tarik", None, 8_000, &bom(&[("m-teh", 5)]))
            .await
            .unwrap();
        repo.delete(&created.id).await.unwrap();

        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_bom WHERE product_id = ?1")
                .bind(&created.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_nonpositive_price_never_reaches_the_menu() {
        let db = test_db().await;
        let repo = db.products();

        let err = repo.insert("Gratisan", None, 0, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo.insert("Minus", None, -5_000, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Nothing was written, so the sale flow can never price it
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_validates_name_and_bom() {
        let db = test_db().await;
        let repo = db.products();

        assert!(repo.insert("", None, 5_000, &[]).await.is_err());

        let err = repo
            .insert("Es Teh", None, 5_000, &bom(&[("m-teh", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_validates_like_insert() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert("Es Teh", None, 5_000, &[]).await.unwrap();
        let err = repo
            .update(&created.id, "Es Teh", None, -1, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Failed update leaves the product untouched
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, 5_000);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_db().await;
        let err = db
            .products()
            .update("ghost", "X", None, 1_000, &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
