//! # Transaction Engines
//!
//! The only code in the system allowed to write `materials.stock` and the
//! immutable history tables.
//!
//! ## Engine Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Validate-Then-Write                             │
//! │                                                                     │
//! │  Every engine operation runs one database transaction:              │
//! │                                                                     │
//! │  Phase 1 (reads)    snapshot every touched material, exactly once   │
//! │  Phase 2 (checks)   validate ALL lines against the snapshot         │
//! │  Phase 3 (writes)   stock updates + history rows, or NOTHING        │
//! │                                                                     │
//! │  Any failed check aborts before the first write. Partially applied  │
//! │  sales do not exist.                                                │
//! │                                                                     │
//! │  Write conflicts (SQLITE_BUSY) surface as DbError::Conflict; the    │
//! │  attempt is re-entrant and re-runs with fresh snapshot reads, up    │
//! │  to MAX_TX_RETRIES times.                                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::error::DbError;
use warung_core::CoreError;

pub mod sale;
pub mod stock_in;

/// How many times an engine re-runs its attempt after a write conflict
/// before giving up with [`DbError::ConflictRetryExhausted`].
pub const MAX_TX_RETRIES: u32 = 5;

/// Errors returned by the transaction engines.
///
/// A union of business-rule failures (warung-core) and storage failures
/// (warung-db). Business failures are final and caller-correctable;
/// `Db(ConflictRetryExhausted)` is transient and may be retried wholesale.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation - do not retry, fix the input.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Linear backoff between conflict retries.
///
/// Attempt 1 waits 10ms, attempt 2 waits 20ms, and so on. Enough to let
/// the competing writer finish; short enough that a cashier never notices.
pub(crate) async fn conflict_backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through() {
        let err: EngineError = CoreError::ProductNotFound("p1".to_string()).into();
        assert_eq!(err.to_string(), "Product not found: p1");
    }

    #[test]
    fn test_db_errors_pass_through() {
        let err: EngineError = DbError::Conflict.into();
        assert!(matches!(err, EngineError::Db(ref e) if e.is_conflict()));
    }
}
