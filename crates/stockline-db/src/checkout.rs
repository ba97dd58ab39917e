//! # Checkout Engine
//!
//! The sale transaction: turns a basket and a staff identity into a
//! committed sale, moving stock atomically.
//!
//! ## Transaction Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(user_id, raw basket, customer)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Basket::from_raw ──── nothing valid ────► EmptyBasket (no DB access)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each distinct item, ascending id:                                 │
//! │      get_item_for_update ── missing / short ──► InsufficientStock      │
//! │       │                                          (ROLLBACK)            │
//! │       ▼                                                                 │
//! │  price lines in basket order, subtotal, GST 18%, total                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sales                                                           │
//! │  for each basket entry: INSERT sale_items, decrement stock             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ─── any error on the way ──► PersistenceFailure (ROLLBACK)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction is an owned [`sqlx::Transaction`]: if the future is
//! dropped before commit (client gone, timeout) it rolls back on drop.
//!
//! ## Lock Order
//! Rows are locked in ascending item id regardless of basket order, so
//! `[A, B]` and `[B, A]` submitted together always queue instead of
//! deadlocking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::error::CheckoutError;
use crate::repository::item::ItemRepository;
use crate::repository::sale::{NewSale, SaleRepository};
use stockline_core::{check_stock, Basket, Item, Money, PricedLine, RawBasketEntry};

/// Optional customer details printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// Trims both fields; blank values become `None`.
    pub fn new(name: Option<String>, phone: Option<String>) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Customer {
            name: clean(name),
            phone: clean(phone),
        }
    }
}

/// A committed sale.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub lines: Vec<PricedLine>,
    pub sale_date: DateTime<Utc>,
}

/// Runs sale transactions against the shared pool.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
}

impl CheckoutEngine {
    /// Creates an engine over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutEngine { pool }
    }

    /// Parses a client basket and records the sale.
    ///
    /// Malformed or non-positive entries are dropped; if none remain the
    /// call fails with [`CheckoutError::EmptyBasket`] without touching the
    /// database.
    pub async fn create_sale(
        &self,
        user_id: i64,
        raw: &[RawBasketEntry],
        customer: Customer,
    ) -> Result<SaleReceipt, CheckoutError> {
        let basket = match Basket::from_raw(raw) {
            Ok(basket) => basket,
            Err(e) => {
                warn!(user_id = user_id, submitted = raw.len(), "Sale rejected: no valid items");
                return Err(e.into());
            }
        };

        if basket.dropped() > 0 {
            debug!(
                user_id = user_id,
                dropped = basket.dropped(),
                kept = basket.entries().len(),
                "Dropped malformed basket entries"
            );
        }

        self.execute(user_id, &basket, customer).await
    }

    /// Records a sale for an already-parsed basket.
    pub async fn execute(
        &self,
        user_id: i64,
        basket: &Basket,
        customer: Customer,
    ) -> Result<SaleReceipt, CheckoutError> {
        let result = self.run(user_id, basket, &customer).await;

        match &result {
            Ok(receipt) => info!(
                sale_id = receipt.sale_id,
                user_id = user_id,
                lines = receipt.lines.len(),
                total_cents = receipt.total.cents(),
                "Sale committed"
            ),
            Err(CheckoutError::PersistenceFailure(e)) => {
                error!(user_id = user_id, error = %e, "Sale transaction failed")
            }
            Err(e) => warn!(user_id = user_id, reason = %e, "Sale rejected"),
        }

        result
    }

    async fn run(
        &self,
        user_id: i64,
        basket: &Basket,
        customer: &Customer,
    ) -> Result<SaleReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        // Lock and validate, ascending id, first failure aborts
        let mut locked: HashMap<i64, Item> = HashMap::new();
        for demand in basket.demands() {
            let item = ItemRepository::get_item_for_update(&mut *tx, demand.item_id)
                .await?
                .ok_or_else(|| CheckoutError::InsufficientStock {
                    item: format!("Item ID {}", demand.item_id),
                    available: 0,
                    requested: demand.requested,
                })?;

            check_stock(&item, demand.requested)?;
            locked.insert(item.id, item);
        }

        let (lines, totals) = basket.price(|id| locked.get(&id).map(Item::price))?;
        let now = Utc::now();

        let sale_id = SaleRepository::insert_sale(
            &mut *tx,
            &NewSale {
                user_id,
                customer_name: customer.name.as_deref(),
                customer_phone: customer.phone.as_deref(),
                totals,
                sale_date: now,
            },
        )
        .await?;

        for line in &lines {
            SaleRepository::insert_line_item(&mut *tx, sale_id, line).await?;
            ItemRepository::decrement_quantity(&mut *tx, line.item_id, line.quantity, now).await?;
        }

        tx.commit().await?;

        Ok(SaleReceipt {
            sale_id,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            lines,
            sale_date: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_blank_fields_are_none() {
        let c = Customer::new(Some("  ".to_string()), Some(" 0300-1234567 ".to_string()));
        assert_eq!(c.name, None);
        assert_eq!(c.phone.as_deref(), Some("0300-1234567"));
        assert_eq!(Customer::new(None, None), Customer::default());
    }
}
