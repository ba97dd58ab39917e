//! # Basket Module
//!
//! Turns a client-submitted basket into the validated, ordered, priced
//! form the checkout transaction works with.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales  { items: [{item_id, quantity}, ...] }                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Basket::from_raw ← lenient: malformed / non-positive entries dropped  │
//! │       │            (all dropped → EmptyBasket, no DB access)           │
//! │       ▼                                                                 │
//! │  Basket::demands  ← distinct items, ascending id, summed quantities    │
//! │       │            (this is the lock order)                            │
//! │       ▼                                                                 │
//! │  check_stock      ← per locked row: quantity >= requested              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Basket::price    ← lines in ORIGINAL basket order + SaleTotals        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Item;
use crate::GST_RATE;

// =============================================================================
// Raw Input
// =============================================================================

/// A basket entry exactly as the client sent it.
///
/// Either field may arrive as a JSON number or a numeric string (HTML form
/// values are strings); anything else fails [`BasketEntry::parse`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBasketEntry {
    #[serde(default)]
    pub item_id: Value,
    #[serde(default)]
    pub quantity: Value,
}

impl RawBasketEntry {
    pub fn new(item_id: impl Into<Value>, quantity: impl Into<Value>) -> Self {
        RawBasketEntry {
            item_id: item_id.into(),
            quantity: quantity.into(),
        }
    }
}

// =============================================================================
// Basket Entry
// =============================================================================

/// A well-formed basket entry: positive item id and positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketEntry {
    pub item_id: i64,
    pub quantity: i64,
}

impl BasketEntry {
    /// Parses one raw entry.
    ///
    /// ## Rules
    /// - `item_id`: integer (or integer string) greater than zero
    /// - `quantity`: integer (or integer string) greater than zero
    pub fn parse(raw: &RawBasketEntry) -> Result<Self, ValidationError> {
        let item_id = parse_integer(&raw.item_id, "item_id")?;
        if item_id <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "item_id".to_string(),
            });
        }

        let quantity = parse_integer(&raw.quantity, "quantity")?;
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }

        Ok(BasketEntry { item_id, quantity })
    }
}

fn parse_integer(value: &Value, field: &str) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null => {
            return Err(ValidationError::Required {
                field: field.to_string(),
            })
        }
        _ => None,
    };

    parsed.ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be an integer".to_string(),
    })
}

// =============================================================================
// Basket
// =============================================================================

/// Quantity requested for one distinct item across the whole basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDemand {
    pub item_id: i64,
    pub requested: i64,
}

/// A non-empty list of valid entries in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    entries: Vec<BasketEntry>,
    dropped: usize,
}

impl Basket {
    /// Builds a basket from client input, silently dropping entries that
    /// fail [`BasketEntry::parse`].
    ///
    /// ## Errors
    /// [`CoreError::EmptyBasket`] when no entry survives.
    pub fn from_raw(raw: &[RawBasketEntry]) -> CoreResult<Self> {
        let entries: Vec<BasketEntry> = raw
            .iter()
            .filter_map(|r| BasketEntry::parse(r).ok())
            .collect();
        let dropped = raw.len() - entries.len();

        if entries.is_empty() {
            return Err(CoreError::EmptyBasket);
        }

        Ok(Basket { entries, dropped })
    }

    /// Builds a basket from already-typed entries, dropping non-positive ones.
    pub fn new(entries: Vec<BasketEntry>) -> CoreResult<Self> {
        let total = entries.len();
        let entries: Vec<BasketEntry> = entries
            .into_iter()
            .filter(|e| e.item_id > 0 && e.quantity > 0)
            .collect();

        if entries.is_empty() {
            return Err(CoreError::EmptyBasket);
        }

        Ok(Basket {
            dropped: total - entries.len(),
            entries,
        })
    }

    /// Valid entries in the order the client submitted them.
    pub fn entries(&self) -> &[BasketEntry] {
        &self.entries
    }

    /// Number of entries discarded while building the basket.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Distinct items in ascending id order with summed quantities.
    ///
    /// Every checkout locks rows in this order, so two baskets naming the
    /// same items in opposite order can never wait on each other in a cycle.
    /// Summing means `[{A,2},{A,3}]` is checked as 5 units of A, not twice
    /// as 2 and 3 against the same shelf count.
    pub fn demands(&self) -> Vec<StockDemand> {
        let mut by_item: BTreeMap<i64, i64> = BTreeMap::new();
        for entry in &self.entries {
            let slot = by_item.entry(entry.item_id).or_insert(0);
            *slot = slot.saturating_add(entry.quantity);
        }

        by_item
            .into_iter()
            .map(|(item_id, requested)| StockDemand { item_id, requested })
            .collect()
    }

    /// Prices every entry in submission order.
    ///
    /// `unit_price` resolves the current price of a locked item; `None`
    /// means the item is unknown.
    pub fn price<F>(&self, mut unit_price: F) -> CoreResult<(Vec<PricedLine>, SaleTotals)>
    where
        F: FnMut(i64) -> Option<Money>,
    {
        let mut lines = Vec::with_capacity(self.entries.len());
        let mut subtotal = Money::zero();

        for entry in &self.entries {
            let price = unit_price(entry.item_id).ok_or(CoreError::ItemNotFound(entry.item_id))?;
            let line_total = price
                .checked_multiply_quantity(entry.quantity)
                .ok_or_else(overflow)?;
            subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;

            lines.push(PricedLine {
                item_id: entry.item_id,
                quantity: entry.quantity,
                unit_price: price,
                line_total,
            });
        }

        let totals = SaleTotals::from_subtotal(subtotal).ok_or_else(overflow)?;
        Ok((lines, totals))
    }
}

fn overflow() -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: "sale total".to_string(),
        min: 0,
        max: i64::MAX,
    })
}

/// Fails with [`CoreError::InsufficientStock`] when `item` cannot cover
/// `requested` units.
pub fn check_stock(item: &Item, requested: i64) -> CoreResult<()> {
    if item.can_fulfil(requested) {
        return Ok(());
    }

    Err(CoreError::InsufficientStock {
        item: item.name.clone(),
        available: item.quantity,
        requested,
    })
}

// =============================================================================
// Pricing
// =============================================================================

/// A basket entry with its price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Sale header amounts.
///
/// Invariants: `tax == subtotal.calculate_tax(GST_RATE)` and
/// `total == subtotal + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Applies GST to `subtotal`. `None` when the total does not fit.
    pub fn from_subtotal(subtotal: Money) -> Option<Self> {
        let tax = subtotal.calculate_tax(GST_RATE);
        let total = subtotal.checked_add(tax)?;
        Some(SaleTotals {
            subtotal,
            tax,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(item_id: i64, quantity: i64) -> BasketEntry {
        BasketEntry { item_id, quantity }
    }

    #[test]
    fn test_parse_accepts_numbers_and_numeric_strings() {
        let raw = RawBasketEntry::new(json!("12"), json!(3));
        assert_eq!(BasketEntry::parse(&raw).unwrap(), entry(12, 3));

        let raw = RawBasketEntry::new(json!(4), json!(" 2 "));
        assert_eq!(BasketEntry::parse(&raw).unwrap(), entry(4, 2));
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        let cases = [
            RawBasketEntry::new(json!(1), json!(0)),
            RawBasketEntry::new(json!(1), json!(-2)),
            RawBasketEntry::new(json!(0), json!(1)),
            RawBasketEntry::new(json!("abc"), json!(1)),
            RawBasketEntry::new(json!(1), json!(1.5)),
            RawBasketEntry::new(json!(null), json!(1)),
            RawBasketEntry::new(json!([1]), json!(1)),
            // Not truncated to a leading integer
            RawBasketEntry::new(json!(1), json!("2.5")),
            RawBasketEntry::new(json!("3abc"), json!(1)),
            RawBasketEntry::new(json!(-1), json!(1)),
            RawBasketEntry::new(json!("-7"), json!(1)),
        ];
        for raw in &cases {
            assert!(BasketEntry::parse(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_zero_quantity_entry_is_dropped() {
        let raw = vec![
            RawBasketEntry::new(json!(1), json!(0)),
            RawBasketEntry::new(json!(2), json!(2)),
        ];
        let basket = Basket::from_raw(&raw).unwrap();
        assert_eq!(basket.entries(), &[entry(2, 2)]);
        assert_eq!(basket.dropped(), 1);
    }

    #[test]
    fn test_all_malformed_is_empty_basket() {
        let raw = vec![
            RawBasketEntry::new(json!("x"), json!(1)),
            RawBasketEntry::new(json!(3), json!(0)),
        ];
        assert!(matches!(Basket::from_raw(&raw), Err(CoreError::EmptyBasket)));
        assert!(matches!(Basket::from_raw(&[]), Err(CoreError::EmptyBasket)));
        assert!(matches!(
            Basket::new(vec![entry(1, -1)]),
            Err(CoreError::EmptyBasket)
        ));
    }

    #[test]
    fn test_demands_are_sorted_and_merged() {
        let basket = Basket::new(vec![entry(9, 1), entry(3, 2), entry(9, 4)]).unwrap();
        assert_eq!(
            basket.demands(),
            vec![
                StockDemand { item_id: 3, requested: 2 },
                StockDemand { item_id: 9, requested: 5 },
            ]
        );
    }

    #[test]
    fn test_price_keeps_submission_order() {
        let basket = Basket::new(vec![entry(9, 1), entry(3, 2)]).unwrap();
        let (lines, totals) = basket
            .price(|id| match id {
                3 => Some(Money::from_cents(250)),
                9 => Some(Money::from_cents(1000)),
                _ => None,
            })
            .unwrap();

        assert_eq!(lines[0].item_id, 9);
        assert_eq!(lines[1].item_id, 3);
        assert_eq!(lines[1].line_total.cents(), 500);
        assert_eq!(totals.subtotal.cents(), 1500);
        let line_sum: Money = lines.iter().map(|l| l.line_total).sum();
        assert_eq!(line_sum, totals.subtotal);
    }

    #[test]
    fn test_totals_example_sale() {
        let basket = Basket::new(vec![entry(1, 3)]).unwrap();
        let (_, totals) = basket.price(|_| Some(Money::from_cents(10000))).unwrap();
        assert_eq!(totals.subtotal.cents(), 30000);
        assert_eq!(totals.tax.cents(), 5400);
        assert_eq!(totals.total.cents(), 35400);
        assert_eq!(totals.total, totals.subtotal + totals.tax);
    }

    #[test]
    fn test_price_unknown_item() {
        let basket = Basket::new(vec![entry(5, 1)]).unwrap();
        assert!(matches!(
            basket.price(|_| None),
            Err(CoreError::ItemNotFound(5))
        ));
    }

    #[test]
    fn test_price_overflow_is_validation_error() {
        let basket = Basket::new(vec![entry(1, i64::MAX)]).unwrap();
        let result = basket.price(|_| Some(Money::from_cents(2)));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_tax_overflow_is_validation_error() {
        // Line and subtotal fit in i64, subtotal + 18% does not
        let basket = Basket::new(vec![entry(1, 1)]).unwrap();
        let result = basket.price(|_| Some(Money::from_cents(8_000_000_000_000_000_000)));
        assert!(matches!(result, Err(CoreError::Validation(_))));

        assert!(SaleTotals::from_subtotal(Money::from_cents(i64::MAX)).is_none());
        let totals = SaleTotals::from_subtotal(Money::from_cents(30000)).unwrap();
        assert_eq!(totals.total.cents(), 35400);
    }

    #[test]
    fn test_check_stock() {
        let item = Item {
            id: 2,
            sku: "PEN-BLU".to_string(),
            name: "Blue Pen".to_string(),
            description: None,
            price_cents: 500,
            quantity: 2,
            min_stock_level: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(check_stock(&item, 2).is_ok());
        match check_stock(&item, 5) {
            Err(CoreError::InsufficientStock { item, available, requested }) => {
                assert_eq!(item, "Blue Pen");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
