//! # Material Repository
//!
//! Database operations for the raw-material catalog.
//!
//! ## The One Thing This Repository Will NOT Do
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Write Policy                               │
//! │                                                                     │
//! │  ❌ There is no `set_stock(id, value)` here, on purpose.            │
//! │                                                                     │
//! │  materials.stock is the shared mutable resource of the system.      │
//! │  An unconditional setter would bypass the validation that keeps     │
//! │  stock ≥ 0 under concurrent checkouts. All stock movement goes      │
//! │  through the transaction engines:                                   │
//! │                                                                     │
//! │    SaleEngine::submit_sale          stock -= BOM requirements       │
//! │    StockInEngine::record_purchase   stock += purchased qty          │
//! │    StockInEngine::reverse_purchase  stock -= reversed qty           │
//! │                                                                     │
//! │  The only stock value written here is the INITIAL stock of a        │
//! │  freshly created material.                                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use warung_core::validation::{validate_name, validate_stock_level, validate_unit};
use warung_core::Material;

/// Repository for material catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.materials();
///
/// let material = repo.insert("Gula Pasir", "g", 5_000, Some(500)).await?;
/// let all = repo.list().await?;
/// let need_reorder = repo.low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    /// Creates a new MaterialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    /// Creates a new material with its initial stock.
    ///
    /// ## Arguments
    /// * `name` - Display name
    /// * `unit` - Unit-of-measure label ("kg", "ml", "pcs")
    /// * `initial_stock` - Opening stock level (validated >= 0 here; the
    ///   schema's CHECK constraint backs this up)
    /// * `min_stock` - Optional advisory low-stock threshold (>= 0)
    pub async fn insert(
        &self,
        name: &str,
        unit: &str,
        initial_stock: i64,
        min_stock: Option<i64>,
    ) -> DbResult<Material> {
        validate_name(name)?;
        validate_unit(unit)?;
        validate_stock_level(initial_stock)?;
        if let Some(min) = min_stock {
            validate_stock_level(min)?;
        }

        let now = Utc::now();
        let material = Material {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            stock: initial_stock,
            min_stock,
            last_used: None,
            last_restocked: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %material.id, name = %material.name, "Inserting material");

        sqlx::query(
            r#"
            INSERT INTO materials (
                id, name, unit, stock, min_stock,
                last_used, last_restocked, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.stock)
        .bind(material.min_stock)
        .bind(material.last_used)
        .bind(material.last_restocked)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(material)
    }

    /// Updates a material's catalog details.
    ///
    /// Touches name, unit and min_stock ONLY - never `stock`, which is
    /// owned by the transaction engines.
    pub async fn update_details(
        &self,
        id: &str,
        name: &str,
        unit: &str,
        min_stock: Option<i64>,
    ) -> DbResult<()> {
        validate_name(name)?;
        validate_unit(unit)?;
        if let Some(min) = min_stock {
            validate_stock_level(min)?;
        }

        debug!(id = %id, "Updating material details");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE materials SET
                name = ?2,
                unit = ?3,
                min_stock = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(unit.trim())
        .bind(min_stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }

    /// Gets a material by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, name, unit, stock, min_stock,
                   last_used, last_restocked, created_at, updated_at
            FROM materials
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    /// Lists all materials, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, name, unit, stock, min_stock,
                   last_used, last_restocked, created_at, updated_at
            FROM materials
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    /// Lists materials at or below their advisory threshold.
    ///
    /// ## Usage
    /// Drives the low-stock warning panel. Advisory only - a material on
    /// this list can still be sold down to zero.
    pub async fn low_stock(&self) -> DbResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, name, unit, stock, min_stock,
                   last_used, last_restocked, created_at, updated_at
            FROM materials
            WHERE min_stock IS NOT NULL
              AND min_stock > 0
              AND stock <= min_stock
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    /// Deletes a material.
    ///
    /// No cross-check that a product BOM still references it - an accepted
    /// data-integrity gap. A later sale of such a product fails with a
    /// missing-material error instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting material");

        let result = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }

    /// Counts materials (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
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
    use warung_core::StockStatus;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.materials();

        let created = repo.insert("Gula Pasir", "g", 5_000, Some(500)).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Gula Pasir");
        assert_eq!(fetched.unit, "g");
        assert_eq!(fetched.stock, 5_000);
        assert_eq!(fetched.min_stock, Some(500));
        assert!(fetched.last_used.is_none());
    }

    #[tokio::test]
    async fn test_update_details_does_not_touch_stock() {
        let db = test_db().await;
        let repo = db.materials();

        let created = repo.insert("Teh", "g", 300, None).await.unwrap();
        repo.update_details(&created.id, "Teh Melati", "g", Some(50))
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Teh Melati");
        assert_eq!(fetched.min_stock, Some(50));
        assert_eq!(fetched.stock, 300);
    }

    #[tokio::test]
    async fn test_insert_validates_fields() {
        let db = test_db().await;
        let repo = db.materials();

        assert!(repo.insert("", "g", 100, None).await.is_err());
        assert!(repo.insert("Gula", "", 100, None).await.is_err());
        assert!(repo.insert("Gula", "g", 100, Some(-1)).await.is_err());

        // Negative stock is a typed validation error, not a schema failure
        let err = repo.insert("Gula", "g", -1, None).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_details_validates_fields() {
        let db = test_db().await;
        let repo = db.materials();

        let created = repo.insert("Teh", "g", 300, None).await.unwrap();
        let err = repo
            .update_details(&created.id, "", "g", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Teh");
    }

    #[tokio::test]
    async fn test_update_missing_material() {
        let db = test_db().await;
        let err = db
            .materials()
            .update_details("ghost", "X", "g", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_low_stock_filter() {
        let db = test_db().await;
        let repo = db.materials();

        repo.insert("Kopi", "g", 100, Some(200)).await.unwrap(); // below threshold
        repo.insert("Gula", "g", 900, Some(200)).await.unwrap(); // healthy
        repo.insert("Es Batu", "pcs", 0, None).await.unwrap(); // no threshold

        let low = repo.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Kopi");
        assert_eq!(low[0].stock_status(), StockStatus::Critical);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.materials();

        let created = repo.insert("Santan", "ml", 1_000, None).await.unwrap();
        repo.delete(&created.id).await.unwrap();

        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
        assert!(repo.delete(&created.id).await.is_err());
    }
}
