//! # Domain Types
//!
//! Core domain types used throughout Warung POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │    Material    │   │    Product     │   │    BomLine     │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  id (UUID)     │   │  id (UUID)     │   │  material_id   │      │
//! │  │  name, unit    │   │  name, price   │   │  qty per unit  │      │
//! │  │  stock         │   │  bom: [BomLine]│   └────────────────┘      │
//! │  │  min_stock     │   │  is_active     │                           │
//! │  └────────────────┘   └────────────────┘                           │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │   SaleRecord   │   │  SaleSummary   │   │  StockInRecord │      │
//! │  │  (per line,    │   │  (per receipt, │   │  (per purchase,│      │
//! │  │   immutable)   │   │   immutable)   │   │   immutable)   │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale and stock-in records denormalize the product/material name and price
//! at write time. History stays readable after the source Product/Material is
//! renamed or deleted - this is deliberate audit-trail design, not waste.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax or service-charge rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1100 bps = 11% (Indonesian PPN)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Material
// =============================================================================

/// A raw material tracked in inventory.
///
/// `stock` is the shared mutable resource of the whole system. It is read
/// freely but written only by the two transaction engines in warung-db;
/// nothing else may set it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Material {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name (unique in practice, not enforced).
    pub name: String,

    /// Unit of measure label, e.g. "kg", "ml", "pcs".
    /// Stock and BOM quantities are integers in this unit.
    pub unit: String,

    /// Current stock level. Invariant: never negative.
    pub stock: i64,

    /// Low-stock warning threshold. Advisory only - never blocks a
    /// transaction.
    pub min_stock: Option<i64>,

    /// Last time a sale consumed this material.
    pub last_used: Option<DateTime<Utc>>,

    /// Last time a stock-in replenished this material.
    pub last_restocked: Option<DateTime<Utc>>,

    /// When the material was created.
    pub created_at: DateTime<Utc>,

    /// When the material was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Classifies the current stock level against the advisory threshold.
    ///
    /// ## Rules (from the stock management screen)
    /// - `Critical` when `stock <= min_stock`
    /// - `Low` when `stock < 2 * min_stock`
    /// - `Healthy` otherwise, or when no threshold is set
    pub fn stock_status(&self) -> StockStatus {
        match self.min_stock {
            Some(min) if min > 0 => {
                if self.stock <= min {
                    StockStatus::Critical
                } else if self.stock < min * 2 {
                    StockStatus::Low
                } else {
                    StockStatus::Healthy
                }
            }
            _ => StockStatus::Healthy,
        }
    }
}

/// Advisory stock level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Stock comfortably above threshold (or no threshold set).
    Healthy,
    /// Stock below twice the threshold - reorder soon.
    Low,
    /// Stock at or below the threshold.
    Critical,
}

// =============================================================================
// Product & BOM
// =============================================================================

/// One bill-of-materials entry: the amount of a material consumed per
/// single unit of product sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BomLine {
    /// Material consumed. No referential check against the materials
    /// catalog at write time; resolution happens at sale time.
    pub material_id: String,

    /// Quantity consumed per product unit, in the material's unit.
    /// Must be > 0.
    pub qty: i64,
}

/// A sellable menu product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the menu and receipts.
    pub name: String,

    /// Optional menu category, e.g. "minuman", "makanan".
    pub category: Option<String>,

    /// Price in rupiah.
    pub price: i64,

    /// Bill of materials: materials consumed per unit sold.
    pub bom: Vec<BomLine>,

    /// Soft toggle; inactive products are excluded from the sale flow
    /// but keep their historical records.
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_rupiah(self.price)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment - requires tendered amount, produces change.
    Cash,
    /// QRIS wallet payment.
    Qris,
    /// Card payment on external terminal.
    Card,
}

// =============================================================================
// Sale Records
// =============================================================================

/// One immutable sale line, written at checkout.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub id: String,
    /// Receipt this line belongs to.
    pub receipt_number: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Quantity sold.
    pub qty: i64,
    /// Unit price in rupiah at time of sale (frozen).
    pub price: i64,
    /// Line total (price × qty).
    pub total: i64,
    /// Optional per-line note ("less sugar", etc.).
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub date: DateTime<Utc>,
}

impl SaleRecord {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_rupiah(self.price)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_rupiah(self.total)
    }
}

/// Denormalized line item carried inside a [`SaleSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummaryItem {
    pub product_name: String,
    pub qty: i64,
    pub price: i64,
    pub total: i64,
}

/// One immutable checkout summary (one per receipt).
///
/// Created once, atomically, at checkout; never mutated; never used to
/// re-derive current stock (stock was mutated separately inside the same
/// transaction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSummary {
    pub id: String,
    pub receipt_number: String,
    /// Denormalized line snapshot (stored as JSON).
    pub items: Vec<SaleSummaryItem>,
    pub subtotal: i64,
    pub tax: i64,
    pub service_charge: i64,
    pub grand_total: i64,
    pub payment_method: PaymentMethod,
    /// Cash tendered (zero for non-cash payments).
    pub cash: i64,
    /// Change returned (zero for non-cash payments).
    pub change: i64,
    pub customer_note: Option<String>,
    pub date: DateTime<Utc>,
}

// =============================================================================
// Stock-In Record
// =============================================================================

/// One immutable purchase ("stock-in") audit record.
///
/// `previous_stock`/`new_stock` are captured at write time as an audit
/// trail. They may be stale by the time the record is deleted - reversal
/// must re-read live stock, never trust these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockInRecord {
    pub id: String,
    pub material_id: String,
    /// Material name at time of purchase (frozen).
    pub material_name: String,
    /// Quantity purchased, in the material's unit.
    pub qty: i64,
    /// Unit price paid, in rupiah.
    pub price: i64,
    /// qty × price.
    pub total: i64,
    /// Stock before this purchase was applied.
    pub previous_stock: i64,
    /// Stock immediately after this purchase was applied.
    pub new_stock: i64,
    pub note: Option<String>,
    pub date: DateTime<Utc>,
}

impl StockInRecord {
    /// Returns the purchase total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_rupiah(self.total)
    }
}

// =============================================================================
// Capital Entry
// =============================================================================

/// A capital injection recorded for financial reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CapitalEntry {
    pub id: String,
    pub description: String,
    /// Amount in rupiah.
    pub amount: i64,
    pub date: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn material(stock: i64, min_stock: Option<i64>) -> Material {
        let now = Utc::now();
        Material {
            id: "m1".to_string(),
            name: "Gula".to_string(),
            unit: "g".to_string(),
            stock,
            min_stock,
            last_used: None,
            last_restocked: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1100);
        assert_eq!(rate.bps(), 1100);
        assert!((rate.percentage() - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(material(100, Some(10)).stock_status(), StockStatus::Healthy);
        assert_eq!(material(19, Some(10)).stock_status(), StockStatus::Low);
        assert_eq!(material(10, Some(10)).stock_status(), StockStatus::Critical);
        assert_eq!(material(0, Some(10)).stock_status(), StockStatus::Critical);
    }

    #[test]
    fn test_stock_status_without_threshold() {
        assert_eq!(material(0, None).stock_status(), StockStatus::Healthy);
        assert_eq!(material(0, Some(0)).stock_status(), StockStatus::Healthy);
    }

    #[test]
    fn test_product_price_as_money() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Kopi Susu".to_string(),
            category: Some("minuman".to_string()),
            price: 18_000,
            bom: vec![BomLine {
                material_id: "m1".to_string(),
                qty: 20,
            }],
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.price().rupiah(), 18_000);
    }
}
