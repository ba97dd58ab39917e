//! Dashboard metrics.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use stockline_db::Dashboard;

use super::ApiResponse;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics))
}

/// Store totals, the low-stock panel and the five newest sales.
async fn metrics(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    let dashboard = state.db.reports().dashboard().await?;
    Ok(ApiResponse::data(dashboard))
}
