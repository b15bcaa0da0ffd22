//! # Financial Report Repository
//!
//! Capital entries and the period financial summary.
//!
//! ## The Balance Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  closing_balance = total_capital + income - expense                 │
//! │                                                                     │
//! │  total_capital   all capital entries, ALL TIME (capital is the      │
//! │                  till's opening float, not a period flow)           │
//! │  income          SUM(transactions.grand_total) in the period        │
//! │  expense         SUM(stock_in.total) in the period                  │
//! │                                                                     │
//! │  Derived from immutable history rows at query time - never stored,  │
//! │  so it can't drift out of sync with the records.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use warung_core::{CapitalEntry, Money};

/// Period financial summary, derived at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// All capital entries ever recorded, in rupiah.
    pub total_capital: i64,
    /// Sale revenue (grand totals) within the period, in rupiah.
    pub income: i64,
    /// Purchase spend within the period, in rupiah.
    pub expense: i64,
    /// `total_capital + income - expense`, in rupiah.
    pub closing_balance: i64,
}

impl FinancialSummary {
    /// Returns the closing balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_rupiah(self.closing_balance)
    }
}

/// Repository for capital entries and financial summaries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Records a capital injection.
    pub async fn add_capital(&self, description: &str, amount: i64) -> DbResult<CapitalEntry> {
        let entry = CapitalEntry {
            id: Uuid::new_v4().to_string(),
            description: description.trim().to_string(),
            amount,
            date: Utc::now(),
        };

        debug!(id = %entry.id, amount, "Recording capital entry");

        sqlx::query(
            r#"
            INSERT INTO capital (id, description, amount, date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.description)
        .bind(entry.amount)
        .bind(entry.date)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists all capital entries, newest first.
    pub async fn list_capital(&self) -> DbResult<Vec<CapitalEntry>> {
        let entries = sqlx::query_as::<_, CapitalEntry>(
            r#"
            SELECT id, description, amount, date
            FROM capital
            ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Computes the financial summary for a period.
    ///
    /// Capital is summed over all time; income and expense over
    /// `[from, to)`.
    pub async fn financial_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<FinancialSummary> {
        let total_capital: Option<i64> = sqlx::query_scalar("SELECT SUM(amount) FROM capital")
            .fetch_one(&self.pool)
            .await?;

        let income: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(grand_total) FROM transactions WHERE date >= ?1 AND date < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let expense: Option<i64> =
            sqlx::query_scalar("SELECT SUM(total) FROM stock_in WHERE date >= ?1 AND date < ?2")
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?;

        let total_capital = total_capital.unwrap_or(0);
        let income = income.unwrap_or(0);
        let expense = expense.unwrap_or(0);

        Ok(FinancialSummary {
            total_capital,
            income,
            expense,
            closing_balance: total_capital + income - expense,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
