//! # Repository Module
//!
//! Database repository implementations for Warung POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  The Repository pattern abstracts database access behind a clean    │
//! │  API.                                                               │
//! │                                                                     │
//! │  Caller                                                             │
//! │       │  db.materials().list()                                      │
//! │       ▼                                                             │
//! │  MaterialRepository                                                 │
//! │  ├── insert(&self, material)                                        │
//! │  ├── update_details(&self, ...)   ← name/unit/min_stock ONLY        │
//! │  ├── get_by_id(&self, id)                                           │
//! │  └── low_stock(&self)                                               │
//! │       │  SQL Query                                                  │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  One deliberate gap: NO repository can write `materials.stock`.     │
//! │  Stock moves only through the engines in [`crate::engine`], which   │
//! │  pair every write with an in-transaction validation read.           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`material::MaterialRepository`] - Material catalog CRUD and low-stock queries
//! - [`product::ProductRepository`] - Menu products and their BOMs
//! - [`sale::SaleRepository`] - Sale history queries (rows are written by the sale engine)
//! - [`stock_in::StockInRepository`] - Purchase history queries (rows are written by the stock-in engine)
//! - [`report::ReportRepository`] - Capital entries and financial summaries

pub mod material;
pub mod product;
pub mod report;
pub mod sale;
pub mod stock_in;
