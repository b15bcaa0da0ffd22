//! # BOM Explosion & Cart Totals
//!
//! Pure checkout math: converting a cart of (product, qty) lines into the
//! material quantities a sale consumes, and into priced totals.
//!
//! ## Checkout Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Cart: [{Es Teh × 2}, {Kopi Susu × 1}]                              │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  explode_bom() ── per cart line, per BOM entry:                     │
//! │       │           required[material] += bom_qty × line_qty          │
//! │       │                                                             │
//! │       │   Es Teh needs 5 g tea, 10 g sugar per unit                 │
//! │       │   Kopi Susu needs 10 g sugar, 20 ml milk per unit           │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  { tea: 10, sugar: 30, milk: 20 }   ← sugar SUMS across products    │
//! │                                                                     │
//! │  price_cart() ── line totals, subtotal, tax, service, grand total   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is deterministic and I/O free. The sale engine in
//! warung-db calls these functions and owns only the transactional parts:
//! snapshot reads, validation against live stock, and the atomic write.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Product, TaxRate};
use crate::validation::validate_cart;

// =============================================================================
// Cart Types
// =============================================================================

/// One cart line as submitted by the caller: which product, how many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub qty: i64,
    /// Optional per-line note ("less ice", etc.) carried onto the sale record.
    pub note: Option<String>,
}

impl CartLine {
    /// Convenience constructor for a plain line.
    pub fn new(product_id: impl Into<String>, qty: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            qty,
            note: None,
        }
    }
}

/// A cart line resolved against the product catalog, with frozen pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub qty: i64,
    pub unit_price: i64,
    pub line_total: i64,
    pub note: Option<String>,
}

/// Computed totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub service_charge: Money,
    pub grand_total: Money,
}

// =============================================================================
// BOM Explosion
// =============================================================================

/// Explodes a cart into aggregate material requirements.
///
/// For each cart line, for each BOM entry of its product, accumulates
/// `required[material_id] += bom_qty * line_qty`. Two products sharing an
/// ingredient contribute their combined amount - the sufficiency check must
/// see the sum, not each product independently.
///
/// ## Returns
/// A `BTreeMap` so callers iterate materials in a stable order (the sale
/// engine relies on this for deterministic read/write ordering), with each
/// distinct material appearing exactly once.
///
/// ## Errors
/// - `Validation` if the cart is empty or any qty is out of range
/// - `ProductNotFound` if a line references a product missing from `products`
pub fn explode_bom(
    cart: &[CartLine],
    products: &HashMap<String, Product>,
) -> CoreResult<BTreeMap<String, i64>> {
    validate_cart(cart)?;

    let mut required: BTreeMap<String, i64> = BTreeMap::new();

    for line in cart {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        for bom_line in &product.bom {
            *required.entry(bom_line.material_id.clone()).or_insert(0) +=
                bom_line.qty * line.qty;
        }
    }

    Ok(required)
}

// =============================================================================
// Cart Pricing
// =============================================================================

/// Resolves cart lines against the catalog and computes totals.
///
/// subtotal = Σ(line totals); tax = subtotal × tax_rate;
/// service = subtotal × service_rate; grand total = subtotal + tax + service.
///
/// ## Errors
/// - `Validation` if the cart is empty or any qty is out of range
/// - `ProductNotFound` if a line references a product missing from `products`
pub fn price_cart(
    cart: &[CartLine],
    products: &HashMap<String, Product>,
    tax_rate: TaxRate,
    service_rate: TaxRate,
) -> CoreResult<(Vec<PricedLine>, CartTotals)> {
    validate_cart(cart)?;

    let mut lines = Vec::with_capacity(cart.len());
    let mut subtotal = Money::zero();

    for line in cart {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let line_total = product.price().multiply_quantity(line.qty);
        subtotal += line_total;

        lines.push(PricedLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            qty: line.qty,
            unit_price: product.price,
            line_total: line_total.rupiah(),
            note: line.note.clone(),
        });
    }

    let tax = subtotal.calculate_charge(tax_rate);
    let service_charge = subtotal.calculate_charge(service_rate);
    let grand_total = subtotal + tax + service_charge;

    Ok((
        lines,
        CartTotals {
            subtotal,
            tax,
            service_charge,
            grand_total,
        },
    ))
}

/// Verifies cash covers the grand total and computes change.
///
/// ## Policy
/// - Non-cash methods tender nothing and receive no change.
/// - A cash shortfall is rejected HERE, before the stock transaction is
///   attempted - no partial sale may exist.
/// - Change is `max(0, tendered - grand_total)`.
pub fn settle_payment(
    method: PaymentMethod,
    cash_tendered: Money,
    grand_total: Money,
) -> CoreResult<Money> {
    match method {
        PaymentMethod::Cash => {
            if cash_tendered < grand_total {
                return Err(CoreError::InsufficientCash {
                    total: grand_total.rupiah(),
                    tendered: cash_tendered.rupiah(),
                });
            }
            Ok(cash_tendered.saturating_sub_floor_zero(grand_total))
        }
        PaymentMethod::Qris | PaymentMethod::Card => Ok(Money::zero()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BomLine;
    use chrono::Utc;

    fn product(id: &str, name: &str, price: i64, bom: Vec<(&str, i64)>) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: None,
            price,
            bom: bom
                .into_iter()
                .map(|(material_id, qty)| BomLine {
                    material_id: material_id.to_string(),
                    qty,
                })
                .collect(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_explosion_sums_shared_material() {
        // Product A needs 2 of M per unit, product B needs 3 of M per unit.
        // Cart {A×2, B×1} must require 2*2 + 3*1 = 7 of M.
        let products = catalog(vec![
            product("a", "A", 10_000, vec![("m", 2)]),
            product("b", "B", 12_000, vec![("m", 3)]),
        ]);
        let cart = vec![CartLine::new("a", 2), CartLine::new("b", 1)];

        let required = explode_bom(&cart, &products).unwrap();
        assert_eq!(required.get("m"), Some(&7));
        assert_eq!(required.len(), 1);
    }

    #[test]
    fn test_explosion_dedups_materials() {
        let products = catalog(vec![
            product("a", "A", 10_000, vec![("flour", 100), ("sugar", 20)]),
            product("b", "B", 8_000, vec![("sugar", 10)]),
        ]);
        let cart = vec![CartLine::new("a", 1), CartLine::new("b", 2)];

        let required = explode_bom(&cart, &products).unwrap();
        assert_eq!(required.len(), 2);
        assert_eq!(required.get("flour"), Some(&100));
        assert_eq!(required.get("sugar"), Some(&40));
    }

    #[test]
    fn test_explosion_rejects_empty_cart() {
        let products = catalog(vec![]);
        let err = explode_bom(&[], &products).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_explosion_rejects_unknown_product() {
        let products = catalog(vec![product("a", "A", 10_000, vec![("m", 1)])]);
        let cart = vec![CartLine::new("ghost", 1)];
        let err = explode_bom(&cart, &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_price_cart_totals() {
        let products = catalog(vec![
            product("a", "Es Teh", 5_000, vec![]),
            product("b", "Nasi Goreng", 20_000, vec![]),
        ]);
        let cart = vec![CartLine::new("a", 3), CartLine::new("b", 1)];

        let (lines, totals) = price_cart(
            &cart,
            &products,
            TaxRate::from_bps(1100),
            TaxRate::zero(),
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total, 15_000);
        assert_eq!(totals.subtotal.rupiah(), 35_000);
        assert_eq!(totals.tax.rupiah(), 3_850);
        assert_eq!(totals.service_charge.rupiah(), 0);
        assert_eq!(totals.grand_total.rupiah(), 38_850);
    }

    #[test]
    fn test_ppn_grand_total_exact() {
        // Subtotal 100,000 at 11% and no service charge → 111,000 exactly
        let products = catalog(vec![product("a", "Paket", 100_000, vec![])]);
        let cart = vec![CartLine::new("a", 1)];

        let (_, totals) = price_cart(
            &cart,
            &products,
            TaxRate::from_bps(1100),
            TaxRate::zero(),
        )
        .unwrap();
        assert_eq!(totals.grand_total.rupiah(), 111_000);
    }

    #[test]
    fn test_settle_cash_change() {
        // Total 47,500; tendered 50,000 → change 2,500
        let change = settle_payment(
            PaymentMethod::Cash,
            Money::from_rupiah(50_000),
            Money::from_rupiah(47_500),
        )
        .unwrap();
        assert_eq!(change.rupiah(), 2_500);
    }

    #[test]
    fn test_settle_cash_shortfall_rejected() {
        let err = settle_payment(
            PaymentMethod::Cash,
            Money::from_rupiah(40_000),
            Money::from_rupiah(47_500),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientCash {
                total: 47_500,
                tendered: 40_000
            }
        ));
    }

    #[test]
    fn test_settle_non_cash_has_no_change() {
        let change = settle_payment(
            PaymentMethod::Qris,
            Money::zero(),
            Money::from_rupiah(47_500),
        )
        .unwrap();
        assert!(change.is_zero());
    }
}
