//! # warung-db: Database Layer for Warung POS
//!
//! This crate provides database access for the Warung POS system.
//! It uses SQLite for local storage with sqlx for async operations, and
//! hosts the two transaction engines that own all stock mutation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Warung POS Data Flow                           │
//! │                                                                     │
//! │  Caller (checkout / stock screen)                                   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   warung-db (THIS CRATE)                    │   │
//! │  │                                                             │   │
//! │  │   ┌────────────┐   ┌──────────────┐   ┌─────────────────┐  │   │
//! │  │   │  Database  │   │ Repositories │   │     Engines     │  │   │
//! │  │   │  (pool.rs) │   │ material.rs  │   │  sale.rs        │  │   │
//! │  │   │            │◄──│ product.rs   │◄──│  stock_in.rs    │  │   │
//! │  │   │ SqlitePool │   │ sale.rs ...  │   │  (atomic stock  │  │   │
//! │  │   │            │   │              │   │   writes ONLY   │  │   │
//! │  │   └────────────┘   └──────────────┘   │   happen here)  │  │   │
//! │  │                                       └─────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode)                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (material, product, ...)
//! - [`engine`] - The sale and stock-in transaction engines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warung_db::{Database, DbConfig};
//! use warung_core::{CartLine, PaymentMethod, Money};
//!
//! let db = Database::new(DbConfig::new("path/to/warung.db")).await?;
//!
//! // Catalog access
//! let menu = db.products().list_active().await?;
//!
//! // Checkout (the ONLY way stock decreases)
//! let sale = db
//!     .sale_engine()
//!     .submit_sale(&cart, PaymentMethod::Cash, Money::from_rupiah(50_000), None)
//!     .await?;
//! println!("receipt {}", sale.receipt_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Engine re-exports: these are the public mutation surface for stock
pub use engine::sale::{CompletedSale, SaleEngine};
pub use engine::stock_in::StockInEngine;
pub use engine::EngineError;

// Repository re-exports for convenience
pub use repository::material::MaterialRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{FinancialSummary, ReportRepository};
pub use repository::sale::SaleRepository;
pub use repository::stock_in::StockInRepository;
