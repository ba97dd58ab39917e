//! # Sale Repository
//!
//! Database operations for sales and sale line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (inside the checkout transaction only)                      │
//! │     └── insert_sale()       → sales row, returns id                    │
//! │     └── insert_line_item()  → one sale_items row per basket entry      │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── list_recent()       → newest first, with staff username        │
//! │     └── get_by_id()         → header                                   │
//! │     └── get_lines()         → lines with current item name             │
//! │                                                                         │
//! │  There is no update or delete: a committed sale is final.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockline_core::{PricedLine, Sale, SaleLineDetail, SaleSummary, SaleTotals};

/// Header fields for a sale about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub user_id: i64,
    pub customer_name: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
    pub totals: SaleTotals,
    pub sale_date: DateTime<Utc>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Latest sales, newest first, each with the staff member's username.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<SaleSummary>> {
        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT s.id, s.user_id, s.customer_name, s.customer_phone,
                   s.subtotal_cents, s.tax_cents, s.total_cents, s.sale_date,
                   u.username
            FROM sales s
            LEFT JOIN users u ON s.user_id = u.id
            ORDER BY s.sale_date DESC, s.id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, customer_name, customer_phone,
                   subtotal_cents, tax_cents, total_cents, sale_date
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets the line items of a sale in insertion (basket) order.
    ///
    /// `name` is the item's current catalog name; the price fields are the
    /// snapshot taken at sale time.
    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<SaleLineDetail>> {
        let lines = sqlx::query_as::<_, SaleLineDetail>(
            r#"
            SELECT si.id, si.sale_id, si.item_id, si.quantity,
                   si.unit_price_cents, si.line_total_cents,
                   i.name
            FROM sale_items si
            LEFT JOIN items i ON si.item_id = i.id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction Primitives (checkout)
    // =========================================================================

    /// Inserts a sale header and returns its id.
    pub async fn insert_sale(conn: &mut SqliteConnection, sale: &NewSale<'_>) -> DbResult<i64> {
        debug!(
            user_id = sale.user_id,
            total_cents = sale.totals.total.cents(),
            "Inserting sale"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                user_id, customer_name, customer_phone,
                subtotal_cents, tax_cents, total_cents, sale_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sale.user_id)
        .bind(sale.customer_name)
        .bind(sale.customer_phone)
        .bind(sale.totals.subtotal.cents())
        .bind(sale.totals.tax.cents())
        .bind(sale.totals.total.cents())
        .bind(sale.sale_date)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one line item with its price snapshot.
    pub async fn insert_line_item(
        conn: &mut SqliteConnection,
        sale_id: i64,
        line: &PricedLine,
    ) -> DbResult<i64> {
        debug!(sale_id = sale_id, item_id = line.item_id, "Adding sale line");

        let result = sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, item_id, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(sale_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.line_total.cents())
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
