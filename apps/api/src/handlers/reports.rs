//! Sales reports and CSV export.
//!
//! ## Export Format
//! ```text
//! Sale_ID,Staff_Member,Subtotal,GST,Total,Date_and_Time
//! 12,cashier,300.00,54.00,354.00,2026-10-18 14:03:27
//! ```
//! Amounts are `major.minor`; a sale whose staff account is gone has an
//! empty `Staff_Member`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use stockline_core::Money;
use stockline_db::{DailySales, ExportRow, ReportPeriod};
use tracing::info;

use super::ApiResponse;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const CSV_HEADER: [&str; 6] = [
    "Sale_ID",
    "Staff_Member",
    "Subtotal",
    "GST",
    "Total",
    "Date_and_Time",
];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(monthly_breakdown))
        .route("/export", get(export_csv))
}

async fn monthly_breakdown(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<DailySales>>>> {
    let days = state.db.reports().daily_breakdown(Utc::now()).await?;
    Ok(ApiResponse::data(days))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub filter: Option<String>,
}

async fn export_csv(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let period = ReportPeriod::from_filter(query.filter.as_deref(), Utc::now());
    let rows = state.db.reports().export_rows(period).await?;

    if rows.is_empty() {
        return Err(ApiError::not_found(format!(
            "No sales data found for the {} period",
            period.name()
        )));
    }

    let body = render_csv(&rows)?;
    info!(period = period.name(), rows = rows.len(), user_id = user.id, "Sales report exported");

    let disposition = format!("attachment; filename=sales_report_{}.csv", period.name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Writes export rows as CSV, header first.
pub fn render_csv(rows: &[ExportRow]) -> Result<String, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let write = |writer: &mut csv::Writer<Vec<u8>>| -> csv::Result<()> {
        writer.write_record(CSV_HEADER)?;
        for row in rows {
            writer.write_record([
                row.sale_id.to_string(),
                row.staff_member.clone().unwrap_or_default(),
                Money::from_cents(row.subtotal_cents).to_string(),
                Money::from_cents(row.tax_cents).to_string(),
                Money::from_cents(row.total_cents).to_string(),
                row.sale_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    };

    write(&mut writer).map_err(|e| ApiError::internal(format!("CSV write failed: {}", e)))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::internal(format!("CSV write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::internal(format!("CSV write failed: {}", e)))
}
