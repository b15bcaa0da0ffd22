//! # Sale History Repository
//!
//! Read-only queries over the immutable sale history.
//!
//! ## Why No Writes Here
//! Sale rows and transaction summaries are only ever written by
//! [`crate::engine::sale::SaleEngine`], inside the same database
//! transaction that decrements stock. A write path here would let a sale
//! appear in history without its stock movement.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use warung_core::{PaymentMethod, SaleRecord, SaleSummary, SaleSummaryItem};

/// Flat row from the `transactions` table; `items` is JSON text.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    receipt_number: String,
    items: String,
    subtotal: i64,
    tax: i64,
    service_charge: i64,
    grand_total: i64,
    payment_method: PaymentMethod,
    cash: i64,
    change: i64,
    customer_note: Option<String>,
    date: DateTime<Utc>,
}

impl TransactionRow {
    fn into_summary(self) -> DbResult<SaleSummary> {
        let items: Vec<SaleSummaryItem> = serde_json::from_str(&self.items)
            .map_err(|e| DbError::Internal(format!("corrupt transaction items JSON: {e}")))?;

        Ok(SaleSummary {
            id: self.id,
            receipt_number: self.receipt_number,
            items,
            subtotal: self.subtotal,
            tax: self.tax,
            service_charge: self.service_charge,
            grand_total: self.grand_total,
            payment_method: self.payment_method,
            cash: self.cash,
            change: self.change,
            customer_note: self.customer_note,
            date: self.date,
        })
    }
}

/// Repository for sale history queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists the sale lines of one receipt.
    pub async fn list_by_receipt(&self, receipt_number: &str) -> DbResult<Vec<SaleRecord>> {
        let records = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, receipt_number, product_id, product_name,
                   qty, price, total, note, payment_method, date
            FROM sales
            WHERE receipt_number = ?1
            ORDER BY product_name
            "#,
        )
        .bind(receipt_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists sale lines in a date range, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        let records = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, receipt_number, product_id, product_name,
                   qty, price, total, note, payment_method, date
            FROM sales
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

    /// Gets one checkout summary by receipt number.
    pub async fn summary_by_receipt(&self, receipt_number: &str) -> DbResult<Option<SaleSummary>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, receipt_number, items, subtotal, tax, service_charge,
                   grand_total, payment_method, cash, change, customer_note, date
            FROM transactions
            WHERE receipt_number = ?1
            "#,
        )
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_summary).transpose()
    }

    /// Lists checkout summaries in a date range, newest first.
    pub async fn summaries_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SaleSummary>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, receipt_number, items, subtotal, tax, service_charge,
                   grand_total, payment_method, cash, change, customer_note, date
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            ORDER BY date DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_summary).collect()
    }

    /// Total revenue (sum of grand totals) in a date range, in rupiah.
    pub async fn total_revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(grand_total)
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts checkout summaries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
//
// History writes only happen through the sale engine, so most coverage for
// this repository lives in the engine tests. Here we only check the
// empty-database and range edge behavior.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_history() {
        let db = test_db().await;
        let repo = db.sales();

        let now = Utc::now();
        let from = now - Duration::days(1);

        assert!(repo.list_by_receipt("TRX-000000").await.unwrap().is_empty());
        assert!(repo.summaries_between(from, now).await.unwrap().is_empty());
        assert_eq!(repo.total_revenue_between(from, now).await.unwrap(), 0);
        assert!(repo
            .summary_by_receipt("TRX-000000")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_corrupt_items_json_is_reported() {
        let db = test_db().await;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, receipt_number, items, subtotal, tax, service_charge,
                grand_total, payment_method, cash, change, customer_note, date
            ) VALUES ('t1', 'TRX-000001', 'not json', 0, 0, 0, 0, 'cash', 0, 0, NULL, ?1)
            "#,
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let err = db
            .sales()
            .summary_by_receipt("TRX-000001")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("items JSON"));
    }
}
