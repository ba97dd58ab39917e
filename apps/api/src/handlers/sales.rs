//! Checkout and sale history.
//!
//! `POST /api/sales` hands the raw basket to the checkout engine
//! unchanged: malformed entries are dropped there, not rejected here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockline_core::{RawBasketEntry, Sale, SaleLineDetail, SaleSummary, SALES_HISTORY_LIMIT};
use stockline_db::Customer;

use super::ApiResponse;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/{id}", get(get_sale))
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub items: Vec<RawBasketEntry>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaleCreated {
    pub sale_id: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

async fn create_sale(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSaleRequest>,
) -> ApiResult<Json<ApiResponse<SaleCreated>>> {
    let customer = Customer::new(req.customer_name, req.customer_phone);

    let receipt = state
        .db
        .checkout()
        .create_sale(user.id, &req.items, customer)
        .await?;

    Ok(ApiResponse::with_message(
        format!("Sale completed! Invoice #{}", receipt.sale_id),
        SaleCreated {
            sale_id: receipt.sale_id,
            subtotal_cents: receipt.subtotal.cents(),
            tax_cents: receipt.tax.cents(),
            total_cents: receipt.total.cents(),
        },
    ))
}

async fn list_sales(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<SaleSummary>>>> {
    let sales = state.db.sales().list_recent(SALES_HISTORY_LIMIT).await?;
    Ok(ApiResponse::data(sales))
}

#[derive(Debug, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleLineDetail>,
}

async fn get_sale(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<SaleDetail>>> {
    let sale = state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale not found"))?;

    let items = state.db.sales().get_lines(id).await?;
    Ok(ApiResponse::data(SaleDetail { sale, items }))
}
