//! # Stock-In History Repository
//!
//! Read-only queries over the immutable purchase audit trail.
//!
//! Rows are written by [`crate::engine::stock_in::StockInEngine`] inside
//! the same transaction that increments stock, and deleted only by its
//! reversal path. This repository never mutates.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use warung_core::StockInRecord;

/// Repository for stock-in history queries.
#[derive(Debug, Clone)]
pub struct StockInRepository {
    pool: SqlitePool,
}

impl StockInRepository {
    /// Creates a new StockInRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockInRepository { pool }
    }

    /// Gets one stock-in record by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockInRecord>> {
        let record = sqlx::query_as::<_, StockInRecord>(
            r#"
            SELECT id, material_id, material_name, qty, price, total,
                   previous_stock, new_stock, note, date
            FROM stock_in
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists stock-in records in a date range, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<StockInRecord>> {
        let records = sqlx::query_as::<_, StockInRecord>(
            r#"
            SELECT id, material_id, material_name, qty, price, total,
                   previous_stock, new_stock, note, date
            FROM stock_in
            WHERE date >= ?1 AND date < ?2
            ORDER BY date DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists the purchase history of one material, newest first.
    pub async fn list_for_material(&self, material_id: &str) -> DbResult<Vec<StockInRecord>> {
        let records = sqlx::query_as::<_, StockInRecord>(
            r#"
            SELECT id, material_id, material_name, qty, price, total,
                   previous_stock, new_stock, note, date
            FROM stock_in
            WHERE material_id = ?1
            ORDER BY date DESC
            "#,
        )
        .bind(material_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Total purchase spend in a date range, in rupiah.
    ///
    /// This is the "expense" side of the financial summary.
    pub async fn total_spend_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total)
            FROM stock_in
            WHERE date >= ?1 AND date < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts stock-in records (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_in")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
//
// Write-path coverage lives with the stock-in engine; only the empty-state
// queries are checked here.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_empty_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stock_ins();

        let now = Utc::now();
        let from = now - Duration::days(7);

        assert!(repo.get_by_id("ghost").await.unwrap().is_none());
        assert!(repo.list_between(from, now).await.unwrap().is_empty());
        assert!(repo.list_for_material("m1").await.unwrap().is_empty());
        assert_eq!(repo.total_spend_between(from, now).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
