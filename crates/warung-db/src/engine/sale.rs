//! # Sale Engine
//!
//! The atomic checkout transaction. This is the heart of the system and
//! the ONLY place stock ever decreases.
//!
//! ## Checkout Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  submit_sale(cart, method, cash, note)                              │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Pure math (no database yet)                                        │
//! │  ├── explode_bom()      cart → { material: required qty }           │
//! │  ├── price_cart()       cart → lines + subtotal/tax/grand total     │
//! │  └── settle_payment()   cash shortfall rejected HERE                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  BEGIN TRANSACTION                                                  │
//! │  │ Phase 1: read every distinct material once (BTreeMap order)      │
//! │  │ Phase 2: check stock >= required for ALL materials               │
//! │  │          any failure → ROLLBACK, nothing written                 │
//! │  │ Phase 3: stock -= required, last_used = now (per material)       │
//! │  │          INSERT sales rows (one per cart line)                   │
//! │  │          INSERT transactions summary (items as JSON)             │
//! │  │ COMMIT ── all effects appear together or not at all              │
//! │  └──                                                                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  CompletedSale { receipt, lines, totals, change }                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On a write conflict the whole attempt re-runs with fresh snapshot
//! reads; stale-read decisions never survive into a commit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{conflict_backoff, EngineError, EngineResult, MAX_TX_RETRIES};
use crate::error::DbError;
use warung_core::bom::{explode_bom, price_cart, settle_payment, CartLine, CartTotals, PricedLine};
use warung_core::validation::validate_cart;
use warung_core::{
    CoreError, Money, PaymentMethod, Product, SaleSummaryItem, TaxRate, DEFAULT_SERVICE_RATE_BPS,
    DEFAULT_TAX_RATE_BPS,
};

/// Material snapshot taken inside the checkout transaction.
#[derive(Debug, sqlx::FromRow)]
struct MaterialSnapshot {
    name: String,
    stock: i64,
}

/// The result of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSale {
    /// Receipt number, e.g. "TRX-482913".
    pub receipt_number: String,
    /// Priced lines as frozen onto the sale records.
    pub items: Vec<PricedLine>,
    /// Subtotal, tax, service charge and grand total.
    pub totals: CartTotals,
    pub payment_method: PaymentMethod,
    /// Cash tendered (zero for non-cash payments).
    pub cash_tendered: Money,
    /// Change returned (zero for non-cash payments).
    pub change: Money,
    pub date: DateTime<Utc>,
}

/// The sale transaction engine.
///
/// Holds its own pool handle plus the tax and service-charge rates applied
/// to every checkout.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
    tax_rate: TaxRate,
    service_rate: TaxRate,
}

impl SaleEngine {
    /// Creates a sale engine with the default rates (11% PPN, no service
    /// charge).
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine {
            pool,
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            service_rate: TaxRate::from_bps(DEFAULT_SERVICE_RATE_BPS),
        }
    }

    /// Creates a sale engine with explicit rates.
    pub fn with_rates(pool: SqlitePool, tax_rate: TaxRate, service_rate: TaxRate) -> Self {
        SaleEngine {
            pool,
            tax_rate,
            service_rate,
        }
    }

    /// Submits a sale: the atomic all-or-nothing checkout.
    ///
    /// ## Guarantees
    /// - Stock for every BOM material is validated against a snapshot read
    ///   in the SAME transaction that writes, so stock never goes negative
    /// - Either every effect commits (stock, sale rows, summary) or none
    /// - Two products sharing a material are checked against their SUMMED
    ///   requirement
    ///
    /// ## Errors
    /// - `Core(Validation)` - empty cart or out-of-range quantity
    /// - `Core(ProductNotFound)` - unknown or deactivated product
    /// - `Core(MaterialNotFound)` - a BOM references a deleted material
    /// - `Core(InsufficientStock)` - not enough of some material
    /// - `Core(InsufficientCash)` - cash tendered below grand total
    /// - `Db(ConflictRetryExhausted)` - persistent write contention
    pub async fn submit_sale(
        &self,
        cart: &[CartLine],
        method: PaymentMethod,
        cash_tendered: Money,
        customer_note: Option<&str>,
    ) -> EngineResult<CompletedSale> {
        validate_cart(cart).map_err(CoreError::from)?;

        let mut attempt = 0;
        loop {
            match self
                .try_submit(cart, method, cash_tendered, customer_note)
                .await
            {
                Err(EngineError::Db(e)) if e.is_conflict() => {
                    attempt += 1;
                    if attempt >= MAX_TX_RETRIES {
                        warn!(attempt, "sale conflict retries exhausted");
                        return Err(DbError::ConflictRetryExhausted.into());
                    }
                    warn!(attempt, "sale hit a write conflict, retrying");
                    conflict_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    /// One re-entrant checkout attempt. Safe to re-run after a conflict:
    /// nothing is committed until the very end and every decision is made
    /// from reads taken within this attempt.
    async fn try_submit(
        &self,
        cart: &[CartLine],
        method: PaymentMethod,
        cash_tendered: Money,
        customer_note: Option<&str>,
    ) -> EngineResult<CompletedSale> {
        // Pure checkout math first. Catalog reads are plain snapshots; the
        // materials table is the consistency point, not product prices.
        let products = self.load_catalog(cart).await?;
        let required = explode_bom(cart, &products).map_err(EngineError::Core)?;
        let (items, totals) =
            price_cart(cart, &products, self.tax_rate, self.service_rate)
                .map_err(EngineError::Core)?;
        let change =
            settle_payment(method, cash_tendered, totals.grand_total).map_err(EngineError::Core)?;

        let now = Utc::now();
        let receipt_number = generate_receipt_number(now);

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Phase 1: snapshot every distinct material, in BTreeMap order so
        // concurrent checkouts touch rows in the same sequence.
        let mut snapshots: Vec<(&String, &i64, MaterialSnapshot)> =
            Vec::with_capacity(required.len());
        for (material_id, qty) in &required {
            let snapshot = sqlx::query_as::<_, MaterialSnapshot>(
                "SELECT name, stock FROM materials WHERE id = ?1",
            )
            .bind(material_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| CoreError::MaterialNotFound(material_id.clone()))?;

            snapshots.push((material_id, qty, snapshot));
        }

        // Phase 2: validate ALL requirements before the first write.
        for (_, qty, snapshot) in &snapshots {
            if snapshot.stock < **qty {
                return Err(CoreError::InsufficientStock {
                    material: snapshot.name.clone(),
                    required: **qty,
                    available: snapshot.stock,
                }
                .into());
            }
        }

        // Phase 3: writes. From here every statement must succeed or the
        // transaction rolls back on drop.
        for (material_id, qty, snapshot) in &snapshots {
            sqlx::query(
                r#"
                UPDATE materials SET
                    stock = ?2,
                    last_used = ?3,
                    updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(material_id)
            .bind(snapshot.stock - **qty)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sales (
                    id, receipt_number, product_id, product_name,
                    qty, price, total, note, payment_method, date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&receipt_number)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.qty)
            .bind(item.unit_price)
            .bind(item.line_total)
            .bind(&item.note)
            .bind(method)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        let summary_items: Vec<SaleSummaryItem> = items
            .iter()
            .map(|item| SaleSummaryItem {
                product_name: item.product_name.clone(),
                qty: item.qty,
                price: item.unit_price,
                total: item.line_total,
            })
            .collect();
        let items_json = serde_json::to_string(&summary_items)
            .map_err(|e| DbError::Internal(format!("serialize transaction items: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, receipt_number, items, subtotal, tax, service_charge,
                grand_total, payment_method, cash, change, customer_note, date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&receipt_number)
        .bind(&items_json)
        .bind(totals.subtotal.rupiah())
        .bind(totals.tax.rupiah())
        .bind(totals.service_charge.rupiah())
        .bind(totals.grand_total.rupiah())
        .bind(method)
        .bind(cash_for_record(method, cash_tendered).rupiah())
        .bind(change.rupiah())
        .bind(customer_note)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            receipt = %receipt_number,
            grand_total = %totals.grand_total,
            lines = items.len(),
            "Sale committed"
        );

        Ok(CompletedSale {
            receipt_number,
            items,
            totals,
            payment_method: method,
            cash_tendered: cash_for_record(method, cash_tendered),
            change,
            date: now,
        })
    }

    /// Loads every distinct cart product into a catalog map. Unknown and
    /// deactivated products both surface as `ProductNotFound`: a disabled
    /// product must not be sellable through a stale cart.
    async fn load_catalog(&self, cart: &[CartLine]) -> EngineResult<HashMap<String, Product>> {
        let repo = crate::repository::product::ProductRepository::new(self.pool.clone());
        let mut products = HashMap::with_capacity(cart.len());

        for line in cart {
            if products.contains_key(&line.product_id) {
                continue;
            }
            let product = repo
                .get_by_id(&line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            products.insert(line.product_id.clone(), product);
        }

        Ok(products)
    }
}

/// Generates a receipt number from the checkout timestamp.
///
/// "TRX-" plus the last six digits of the millisecond clock. Unique enough
/// for a single till; the transaction id (UUID) is the real primary key.
fn generate_receipt_number(now: DateTime<Utc>) -> String {
    format!("TRX-{:06}", now.timestamp_millis() % 1_000_000)
}

/// Non-cash payments record zero cash regardless of what was passed in.
fn cash_for_record(method: PaymentMethod, tendered: Money) -> Money {
    match method {
        PaymentMethod::Cash => tendered,
        PaymentMethod::Qris | PaymentMethod::Card => Money::zero(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use warung_core::BomLine;

    /// Test fixture: two materials, two products sharing one of them.
    ///
    /// ```text
    /// Es Teh (5,000)      = 5 teh + 15 gula
    /// Kopi Susu (18,000)  = 10 gula + 20 kopi
    /// ```
    struct Fixture {
        db: Database,
        teh: String,
        gula: String,
        kopi: String,
        es_teh: String,
        kopi_susu: String,
    }

    async fn setup(teh_stock: i64, gula_stock: i64, kopi_stock: i64) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let materials = db.materials();

        let teh = materials.insert("Teh", "g", teh_stock, None).await.unwrap();
        let gula = materials
            .insert("Gula", "g", gula_stock, Some(100))
            .await
            .unwrap();
        let kopi = materials
            .insert("Kopi", "g", kopi_stock, None)
            .await
            .unwrap();

        let products = db.products();
        let es_teh = products
            .insert(
                "Es Teh",
                Some("minuman"),
                5_000,
                &[
                    BomLine {
                        material_id: teh.id.clone(),
                        qty: 5,
                    },
                    BomLine {
                        material_id: gula.id.clone(),
                        qty: 15,
                    },
                ],
            )
            .await
            .unwrap();
        let kopi_susu = products
            .insert(
                "Kopi Susu",
                Some("minuman"),
                18_000,
                &[
                    BomLine {
                        material_id: gula.id.clone(),
                        qty: 10,
                    },
                    BomLine {
                        material_id: kopi.id.clone(),
                        qty: 20,
                    },
                ],
            )
            .await
            .unwrap();

        Fixture {
            db,
            teh: teh.id,
            gula: gula.id,
            kopi: kopi.id,
            es_teh: es_teh.id,
            kopi_susu: kopi_susu.id,
        }
    }

    async fn stock_of(fx: &Fixture, id: &str) -> i64 {
        fx.db.materials().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_cash_sale_happy_path() {
        let fx = setup(1_000, 1_000, 1_000).await;
        let engine = fx.db.sale_engine();

        // 2× Es Teh + 1× Kopi Susu = 10,000 + 18,000 = 28,000 subtotal
        // tax 11% = 3,080; grand total 31,080
        let cart = vec![
            CartLine::new(fx.es_teh.clone(), 2),
            CartLine::new(fx.kopi_susu.clone(), 1),
        ];
        let sale = engine
            .submit_sale(&cart, PaymentMethod::Cash, Money::from_rupiah(40_000), None)
            .await
            .unwrap();

        assert!(sale.receipt_number.starts_with("TRX-"));
        assert_eq!(sale.totals.subtotal.rupiah(), 28_000);
        assert_eq!(sale.totals.tax.rupiah(), 3_080);
        assert_eq!(sale.totals.grand_total.rupiah(), 31_080);
        assert_eq!(sale.change.rupiah(), 40_000 - 31_080);

        // Stock effects: teh 2×5, gula 2×15 + 1×10, kopi 1×20
        assert_eq!(stock_of(&fx, &fx.teh).await, 1_000 - 10);
        assert_eq!(stock_of(&fx, &fx.gula).await, 1_000 - 40);
        assert_eq!(stock_of(&fx, &fx.kopi).await, 1_000 - 20);

        // last_used stamped on every consumed material
        let teh = fx.db.materials().get_by_id(&fx.teh).await.unwrap().unwrap();
        assert!(teh.last_used.is_some());

        // History rows: two sale lines and one summary, in the same commit
        let lines = fx
            .db
            .sales()
            .list_by_receipt(&sale.receipt_number)
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);

        let summary = fx
            .db
            .sales()
            .summary_by_receipt(&sale.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.grand_total, 31_080);
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.cash, 40_000);
        assert_eq!(summary.change, 40_000 - 31_080);
    }

    #[tokio::test]
    async fn test_shared_material_requirement_is_summed() {
        // gula: Es Teh×2 needs 30, Kopi Susu×1 needs 10 → 40 total.
        // 35 in stock covers each product alone but not the sum.
        let fx = setup(1_000, 35, 1_000).await;
        let engine = fx.db.sale_engine();

        let cart = vec![
            CartLine::new(fx.es_teh.clone(), 2),
            CartLine::new(fx.kopi_susu.clone(), 1),
        ];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None)
            .await
            .unwrap_err();

        match err {
            EngineError::Core(CoreError::InsufficientStock {
                material,
                required,
                available,
            }) => {
                assert_eq!(material, "Gula");
                assert_eq!(required, 40);
                assert_eq!(available, 35);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_sale_writes_nothing() {
        // teh has plenty, gula is short. Rejection must leave teh untouched
        // too and write no history.
        let fx = setup(1_000, 5, 1_000).await;
        let engine = fx.db.sale_engine();

        let cart = vec![CartLine::new(fx.es_teh.clone(), 1)];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Cash, Money::from_rupiah(10_000), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(stock_of(&fx, &fx.teh).await, 1_000);
        assert_eq!(stock_of(&fx, &fx.gula).await, 5);
        assert_eq!(fx.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cash_shortfall_rejected_before_any_write() {
        let fx = setup(1_000, 1_000, 1_000).await;
        let engine = fx.db.sale_engine();

        // Es Teh ×1 = 5,000 + 550 tax = 5,550; tender only 5,000
        let cart = vec![CartLine::new(fx.es_teh.clone(), 1)];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Cash, Money::from_rupiah(5_000), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientCash {
                total: 5_550,
                tendered: 5_000
            })
        ));

        assert_eq!(stock_of(&fx, &fx.teh).await, 1_000);
        assert_eq!(fx.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_products_rejected() {
        let fx = setup(1_000, 1_000, 1_000).await;
        let engine = fx.db.sale_engine();

        let cart = vec![CartLine::new("ghost", 1)];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ProductNotFound(ref id)) if id == "ghost"
        ));

        // Deactivate and try selling through a stale cart
        fx.db.products().set_active(&fx.es_teh, false).await.unwrap();
        let cart = vec![CartLine::new(fx.es_teh.clone(), 1)];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_material_fails_sale_cleanly() {
        let fx = setup(1_000, 1_000, 1_000).await;
        fx.db.materials().delete(&fx.teh).await.unwrap();

        let engine = fx.db.sale_engine();
        let cart = vec![CartLine::new(fx.es_teh.clone(), 1)];
        let err = engine
            .submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::MaterialNotFound(ref id)) if *id == fx.teh
        ));
        // Sibling material untouched, no history written
        assert_eq!(stock_of(&fx, &fx.gula).await, 1_000);
        assert_eq!(fx.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let fx = setup(10, 10, 10).await;
        let err = fx
            .db
            .sale_engine()
            .submit_sale(&[], PaymentMethod::Cash, Money::zero(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_non_cash_records_zero_cash_and_change() {
        let fx = setup(1_000, 1_000, 1_000).await;
        let sale = fx
            .db
            .sale_engine()
            .submit_sale(
                &[CartLine::new(fx.es_teh.clone(), 1)],
                PaymentMethod::Qris,
                Money::from_rupiah(999_999), // ignored for non-cash
                None,
            )
            .await
            .unwrap();

        assert!(sale.cash_tendered.is_zero());
        assert!(sale.change.is_zero());

        let summary = fx
            .db
            .sales()
            .summary_by_receipt(&sale.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.cash, 0);
        assert_eq!(summary.change, 0);
        assert_eq!(summary.payment_method, PaymentMethod::Qris);
    }

    #[tokio::test]
    async fn test_concurrent_sales_cannot_oversell() {
        // Stock covers exactly one Kopi Susu (20 kopi). Two concurrent
        // checkouts race for it; exactly one may win.
        let fx = setup(1_000, 1_000, 20).await;
        let engine = fx.db.sale_engine();

        let cart = vec![CartLine::new(fx.kopi_susu.clone(), 1)];
        let (a, b) = tokio::join!(
            engine.submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None),
            engine.submit_sale(&cart, PaymentMethod::Qris, Money::zero(), None),
        );

        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1, "exactly one of two racing sales must win");

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser.unwrap_err(),
            EngineError::Core(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(stock_of(&fx, &fx.kopi).await, 0);
        assert_eq!(fx.db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_snapshots_survive_catalog_edits() {
        let fx = setup(1_000, 1_000, 1_000).await;
        let sale = fx
            .db
            .sale_engine()
            .submit_sale(
                &[CartLine::new(fx.es_teh.clone(), 2)],
                PaymentMethod::Cash,
                Money::from_rupiah(20_000),
                None,
            )
            .await
            .unwrap();

        // Rename and reprice the product, then delete it outright
        fx.db
            .products()
            .update(&fx.es_teh, "Es Teh Jumbo", None, 9_000, &[])
            .await
            .unwrap();
        fx.db.products().delete(&fx.es_teh).await.unwrap();

        let lines = fx
            .db
            .sales()
            .list_by_receipt(&sale.receipt_number)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_name, "Es Teh");
        assert_eq!(lines[0].price, 5_000);
        assert_eq!(lines[0].total, 10_000);
    }

    #[tokio::test]
    async fn test_line_note_carried_onto_record() {
        let fx = setup(1_000, 1_000, 1_000).await;

        let mut line = CartLine::new(fx.es_teh.clone(), 1);
        line.note = Some("less sugar".to_string());

        let sale = fx
            .db
            .sale_engine()
            .submit_sale(
                &[line],
                PaymentMethod::Cash,
                Money::from_rupiah(10_000),
                Some("takeaway"),
            )
            .await
            .unwrap();

        let lines = fx
            .db
            .sales()
            .list_by_receipt(&sale.receipt_number)
            .await
            .unwrap();
        assert_eq!(lines[0].note.as_deref(), Some("less sugar"));

        let summary = fx
            .db
            .sales()
            .summary_by_receipt(&sale.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.customer_note.as_deref(), Some("takeaway"));
    }

    #[test]
    fn test_receipt_number_format() {
        let now = Utc::now();
        let receipt = generate_receipt_number(now);
        assert_eq!(receipt.len(), "TRX-".len() + 6);
        assert!(receipt.starts_with("TRX-"));
        assert!(receipt["TRX-".len()..].chars().all(|c| c.is_ascii_digit()));
    }
}
