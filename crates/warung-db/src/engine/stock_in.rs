//! # Stock-In Engine
//!
//! Records material purchases and reverses mistaken ones. The ONLY place
//! stock increases, and the only deleter of stock-in records.
//!
//! ## Purchase & Reversal
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  record_purchase(material, qty, price)                              │
//! │  │ BEGIN                                                            │
//! │  │   read material ──────── missing → MaterialNotFound              │
//! │  │   stock += qty, last_restocked = now                             │
//! │  │   INSERT stock_in { previous_stock, new_stock, ... }             │
//! │  │ COMMIT                                                           │
//! │  └──                                                                │
//! │                                                                     │
//! │  reverse_purchase(record_id)                                       │
//! │  │ BEGIN                                                            │
//! │  │   read record ────────── missing → NotFound                      │
//! │  │   read material CURRENT stock (never trust record.new_stock:     │
//! │  │   sales may have consumed since the purchase)                    │
//! │  │   current - record.qty < 0 → InsufficientStockForReversal        │
//! │  │   stock -= record.qty                                            │
//! │  │   DELETE stock_in record                                         │
//! │  │ COMMIT                                                           │
//! │  └──                                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{conflict_backoff, EngineError, EngineResult, MAX_TX_RETRIES};
use crate::error::DbError;
use warung_core::validation::{validate_price, validate_purchase_quantity};
use warung_core::{CoreError, StockInRecord};

/// Material snapshot taken inside a stock-in transaction.
#[derive(Debug, sqlx::FromRow)]
struct MaterialSnapshot {
    name: String,
    stock: i64,
}

/// The stock-in transaction engine.
#[derive(Debug, Clone)]
pub struct StockInEngine {
    pool: SqlitePool,
}

impl StockInEngine {
    /// Creates a stock-in engine.
    pub fn new(pool: SqlitePool) -> Self {
        StockInEngine { pool }
    }

    /// Records a purchase: atomically increments stock and writes the
    /// audit record.
    ///
    /// ## Errors
    /// - `Core(Validation)` - qty or price not positive
    /// - `Core(MaterialNotFound)` - unknown material
    /// - `Db(ConflictRetryExhausted)` - persistent write contention
    pub async fn record_purchase(
        &self,
        material_id: &str,
        qty: i64,
        price: i64,
        note: Option<&str>,
    ) -> EngineResult<StockInRecord> {
        validate_purchase_quantity(qty).map_err(CoreError::from)?;
        validate_price(price).map_err(CoreError::from)?;

        let mut attempt = 0;
        loop {
            match self.try_record(material_id, qty, price, note).await {
                Err(EngineError::Db(e)) if e.is_conflict() => {
                    attempt += 1;
                    if attempt >= MAX_TX_RETRIES {
                        warn!(attempt, "stock-in conflict retries exhausted");
                        return Err(DbError::ConflictRetryExhausted.into());
                    }
                    warn!(attempt, "stock-in hit a write conflict, retrying");
                    conflict_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    /// Reverses a stock-in record: atomically subtracts its quantity from
    /// CURRENT stock and deletes the record.
    ///
    /// Refused (not clamped) when sales have already consumed part of the
    /// purchased quantity, so the audit trail stays arithmetically honest.
    ///
    /// ## Errors
    /// - `Db(NotFound)` - no such record (already reversed?)
    /// - `Core(MaterialNotFound)` - the material was deleted since
    /// - `Core(InsufficientStockForReversal)` - current stock too low
    /// - `Db(ConflictRetryExhausted)` - persistent write contention
    pub async fn reverse_purchase(&self, record_id: &str) -> EngineResult<StockInRecord> {
        let mut attempt = 0;
        loop {
            match self.try_reverse(record_id).await {
                Err(EngineError::Db(e)) if e.is_conflict() => {
                    attempt += 1;
                    if attempt >= MAX_TX_RETRIES {
                        warn!(attempt, "reversal conflict retries exhausted");
                        return Err(DbError::ConflictRetryExhausted.into());
                    }
                    warn!(attempt, "reversal hit a write conflict, retrying");
                    conflict_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn try_record(
        &self,
        material_id: &str,
        qty: i64,
        price: i64,
        note: Option<&str>,
    ) -> EngineResult<StockInRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let snapshot = sqlx::query_as::<_, MaterialSnapshot>(
            "SELECT name, stock FROM materials WHERE id = ?1",
        )
        .bind(material_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CoreError::MaterialNotFound(material_id.to_string()))?;

        let record = StockInRecord {
            id: Uuid::new_v4().to_string(),
            material_id: material_id.to_string(),
            material_name: snapshot.name,
            qty,
            price,
            total: qty * price,
            previous_stock: snapshot.stock,
            new_stock: snapshot.stock + qty,
            note: note.map(str::to_string),
            date: now,
        };

        sqlx::query(
            r#"
            UPDATE materials SET
                stock = ?2,
                last_restocked = ?3,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(material_id)
        .bind(record.new_stock)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO stock_in (
                id, material_id, material_name, qty, price, total,
                previous_stock, new_stock, note, date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.material_id)
        .bind(&record.material_name)
        .bind(record.qty)
        .bind(record.price)
        .bind(record.total)
        .bind(record.previous_stock)
        .bind(record.new_stock)
        .bind(&record.note)
        .bind(record.date)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            material = %record.material_name,
            qty,
            new_stock = record.new_stock,
            "Stock-in recorded"
        );

        Ok(record)
    }

    async fn try_reverse(&self, record_id: &str) -> EngineResult<StockInRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let record = sqlx::query_as::<_, StockInRecord>(
            r#"
            SELECT id, material_id, material_name, qty, price, total,
                   previous_stock, new_stock, note, date
            FROM stock_in
            WHERE id = ?1
            "#,
        )
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::not_found("StockInRecord", record_id))?;

        // Re-read CURRENT stock. record.new_stock is a write-time snapshot
        // and may be stale by now.
        let snapshot = sqlx::query_as::<_, MaterialSnapshot>(
            "SELECT name, stock FROM materials WHERE id = ?1",
        )
        .bind(&record.material_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CoreError::MaterialNotFound(record.material_id.clone()))?;

        if snapshot.stock - record.qty < 0 {
            return Err(CoreError::InsufficientStockForReversal {
                material: snapshot.name,
                record_qty: record.qty,
                available: snapshot.stock,
            }
            .into());
        }

        sqlx::query(
            r#"
            UPDATE materials SET
                stock = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&record.material_id)
        .bind(snapshot.stock - record.qty)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        sqlx::query("DELETE FROM stock_in WHERE id = ?1")
            .bind(record_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            material = %record.material_name,
            qty = record.qty,
            "Stock-in reversed"
        );

        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
