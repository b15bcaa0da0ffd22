//! # Error Types
//!
//! Domain-specific error types for warung-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  warung-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  warung-db errors (separate crate)                                  │
//! │  ├── DbError          - Storage failures, conflict exhaustion       │
//! │  └── EngineError      - Core ∪ Db, returned by the engines          │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → EngineError → Caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (material name, amounts)
//! 3. Errors are enum variants, never String
//! 4. Failures that affect correctness are never downgraded to warnings:
//!    insufficient stock blocks the sale, always

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product no longer exists (or is inactive).
    ///
    /// ## When This Occurs
    /// - Cart references a product that was deleted between the menu
    ///   snapshot and checkout
    /// - Product was soft-disabled while the cart was open
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Referenced material no longer exists.
    ///
    /// ## When This Occurs
    /// - A product's BOM points at a material that was deleted
    /// - Stock-in targets a removed material
    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    /// Insufficient material stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout cart (needs 7 kg Flour)
    ///      │
    ///      ▼
    /// Snapshot read: stock = 5 kg
    ///      │
    ///      ▼
    /// InsufficientStock { material: "Flour", required: 7, available: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient Flour: need 7, have 5"  (sale NOT applied)
    /// ```
    #[error("Insufficient stock of {material}: required {required}, available {available}")]
    InsufficientStock {
        material: String,
        required: i64,
        available: i64,
    },

    /// Reversing a stock-in record would drive stock negative.
    ///
    /// ## When This Occurs
    /// Sales consumed part of the purchased quantity after the stock-in was
    /// recorded. The record quantity can no longer be subtracted from live
    /// stock, so the deletion is refused rather than clamping to zero.
    #[error(
        "Cannot reverse stock-in of {material}: record quantity {record_qty}, current stock {available}"
    )]
    InsufficientStockForReversal {
        material: String,
        record_qty: i64,
        available: i64,
    },

    /// Cash tendered does not cover the grand total.
    ///
    /// Rejected before the stock transaction is even attempted; a cash
    /// shortfall must never leave a partial sale behind.
    #[error("Cash tendered {tendered} is less than grand total {total}")]
    InsufficientCash { total: i64, tendered: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            material: "Flour".to_string(),
            required: 7,
            available: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock of Flour: required 7, available 5"
        );
    }

    #[test]
    fn test_reversal_message_names_material() {
        let err = CoreError::InsufficientStockForReversal {
            material: "Sugar".to_string(),
            record_qty: 10,
            available: 2,
        };
        assert!(err.to_string().contains("Sugar"));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::EmptyCart;
        assert_eq!(err.to_string(), "cart is empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "qty".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
