//! # warung-core: Pure Business Logic for Warung POS
//!
//! This crate is the **heart** of Warung POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Warung POS Architecture                        │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller (POS frontend)                    │   │
//! │  │    Menu UI ──► Cart UI ──► Checkout ──► Receipt             │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │               ★ warung-core (THIS CRATE) ★                  │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌────────────┐    │   │
//! │  │   │  types  │  │  money  │  │   bom   │  │ validation │    │   │
//! │  │   │Material │  │  Money  │  │ explode │  │   rules    │    │   │
//! │  │   │ Product │  │ TaxRate │  │ totals  │  │   checks   │    │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └────────────┘    │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │                 warung-db (Database Layer)                  │   │
//! │  │        SQLite repositories + the transaction engines        │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Material, Product, sale and stock-in records)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`bom`] - Bill-of-materials explosion and cart totals
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in rupiah (i64) - no floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bom;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use warung_core::Money` instead of
// `use warung_core::money::Money`

pub use bom::{CartLine, CartTotals, PricedLine};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate in basis points (1100 = 11% PPN).
///
/// ## Business Reason
/// Indonesian value-added tax. Checkout applies this rate to the cart
/// subtotal unless the caller configures a different one.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1100;

/// Default service charge in basis points (0 = no service charge).
pub const DEFAULT_SERVICE_RATE_BPS: u32 = 0;

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
