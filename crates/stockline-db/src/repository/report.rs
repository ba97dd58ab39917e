//! # Report Repository
//!
//! Read-only aggregations over the catalog and recorded sales.
//!
//! ## Reports
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dashboard()        → totals + low stock (≤10) + recent sales (5)      │
//! │  daily_breakdown()  → one row per day of a month, newest day first     │
//! │  export_rows()      → every sale of a day or month, for CSV export     │
//! │                                                                         │
//! │  Periods are computed in UTC and bound as strings:                      │
//! │    Daily   "2026-10-18" matched against date(sale_date)                │
//! │    Monthly "2026-10"    matched against strftime('%Y-%m', sale_date)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::item::ItemRepository;
use crate::repository::sale::SaleRepository;
use stockline_core::{Item, SaleSummary, LOW_STOCK_LIMIT, RECENT_SALES_LIMIT};

// =============================================================================
// Report Types
// =============================================================================

/// Store-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DashboardMetrics {
    pub total_items: i64,
    pub total_revenue_cents: i64,
    pub total_transactions: i64,
}

/// Everything the dashboard shows in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub low_stock_items: Vec<Item>,
    pub recent_sales: Vec<SaleSummary>,
}

/// Sales totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DailySales {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_transactions: i64,
    pub total_revenue_cents: i64,
}

/// One line of the CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct ExportRow {
    pub sale_id: i64,
    pub staff_member: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub sale_date: DateTime<Utc>,
}

/// A reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// The calendar day containing the timestamp.
    Daily(DateTime<Utc>),
    /// The calendar month containing the timestamp.
    Monthly(DateTime<Utc>),
}

impl ReportPeriod {
    /// Parses an export filter. Anything other than `daily` means monthly.
    pub fn from_filter(filter: Option<&str>, now: DateTime<Utc>) -> Self {
        match filter.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("daily") => ReportPeriod::Daily(now),
            _ => ReportPeriod::Monthly(now),
        }
    }

    /// `daily` or `monthly`.
    pub fn name(&self) -> &'static str {
        match self {
            ReportPeriod::Daily(_) => "daily",
            ReportPeriod::Monthly(_) => "monthly",
        }
    }

    fn key(&self) -> String {
        match self {
            ReportPeriod::Daily(at) => at.format("%Y-%m-%d").to_string(),
            ReportPeriod::Monthly(at) => at.format("%Y-%m").to_string(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Item count, lifetime revenue and transaction count.
    pub async fn metrics(&self) -> DbResult<DashboardMetrics> {
        let metrics = sqlx::query_as::<_, DashboardMetrics>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items) AS total_items,
                COALESCE(SUM(total_cents), 0) AS total_revenue_cents,
                COUNT(*) AS total_transactions
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(metrics)
    }

    /// Metrics plus the low-stock and recent-sales panels.
    pub async fn dashboard(&self) -> DbResult<Dashboard> {
        let items = ItemRepository::new(self.pool.clone());
        let sales = SaleRepository::new(self.pool.clone());

        let (metrics, low_stock_items, recent_sales) = tokio::try_join!(
            self.metrics(),
            items.low_stock(LOW_STOCK_LIMIT),
            sales.list_recent(RECENT_SALES_LIMIT),
        )?;

        debug!(
            low_stock = low_stock_items.len(),
            recent = recent_sales.len(),
            "Dashboard loaded"
        );

        Ok(Dashboard {
            metrics,
            low_stock_items,
            recent_sales,
        })
    }

    /// Per-day transaction count and revenue for the month containing `at`,
    /// newest day first. Days without sales are absent.
    pub async fn daily_breakdown(&self, at: DateTime<Utc>) -> DbResult<Vec<DailySales>> {
        let month = ReportPeriod::Monthly(at).key();

        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                date(sale_date) AS date,
                COUNT(id) AS total_transactions,
                COALESCE(SUM(total_cents), 0) AS total_revenue_cents
            FROM sales
            WHERE strftime('%Y-%m', sale_date) = ?1
            GROUP BY date(sale_date)
            ORDER BY date DESC
            "#,
        )
        .bind(&month)
        .fetch_all(&self.pool)
        .await?;

        debug!(month = %month, days = rows.len(), "Daily breakdown loaded");
        Ok(rows)
    }

    /// Every sale in `period`, newest first, with the staff username.
    pub async fn export_rows(&self, period: ReportPeriod) -> DbResult<Vec<ExportRow>> {
        let sql = match period {
            ReportPeriod::Daily(_) => {
                r#"
                SELECT s.id AS sale_id, u.username AS staff_member,
                       s.subtotal_cents, s.tax_cents, s.total_cents, s.sale_date
                FROM sales s
                LEFT JOIN users u ON s.user_id = u.id
                WHERE date(s.sale_date) = ?1
                ORDER BY s.sale_date DESC, s.id DESC
                "#
            }
            ReportPeriod::Monthly(_) => {
                r#"
                SELECT s.id AS sale_id, u.username AS staff_member,
                       s.subtotal_cents, s.tax_cents, s.total_cents, s.sale_date
                FROM sales s
                LEFT JOIN users u ON s.user_id = u.id
                WHERE strftime('%Y-%m', s.sale_date) = ?1
                ORDER BY s.sale_date DESC, s.id DESC
                "#
            }
        };

        let rows = sqlx::query_as::<_, ExportRow>(sql)
            .bind(period.key())
            .fetch_all(&self.pool)
            .await?;

        debug!(period = period.name(), rows = rows.len(), "Export rows loaded");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_from_filter() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();

        let daily = ReportPeriod::from_filter(Some("daily"), now);
        assert_eq!(daily.name(), "daily");
        assert_eq!(daily.key(), "2026-03-07");

        let monthly = ReportPeriod::from_filter(None, now);
        assert_eq!(monthly.name(), "monthly");
        assert_eq!(monthly.key(), "2026-03");

        assert_eq!(ReportPeriod::from_filter(Some("weekly"), now).name(), "monthly");
    }
}
