//! Catalog management.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use stockline_core::Item;
use stockline_db::{DbError, NewItem};
use tracing::info;

use super::{ApiResponse, Created};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
}

fn item_not_found() -> ApiError {
    ApiError::not_found("Item not found")
}

async fn list_items(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<Item>>>> {
    let items = state.db.items().list().await?;
    Ok(ApiResponse::data(items))
}

async fn get_item(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Item>>> {
    let item = state
        .db
        .items()
        .get_by_id(id)
        .await?
        .ok_or_else(item_not_found)?;

    Ok(ApiResponse::data(item))
}

async fn create_item(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewItem>,
) -> ApiResult<Json<ApiResponse<Created>>> {
    let item = req.validated()?;

    let created = state.db.items().insert(&item).await.map_err(|e| match e {
        DbError::UniqueViolation { .. } => {
            ApiError::validation("An item with that SKU already exists")
        }
        other => ApiError::from(other),
    })?;

    info!(item_id = created.id, sku = %created.sku, user_id = user.id, "Item added");
    Ok(ApiResponse::with_message(
        "Item added successfully",
        Created { id: created.id },
    ))
}

async fn update_item(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewItem>,
) -> ApiResult<Json<ApiResponse<Item>>> {
    let item = req.validated()?;

    let updated = state.db.items().update(id, &item).await.map_err(|e| match e {
        DbError::UniqueViolation { .. } => {
            ApiError::validation("Another item is already using that SKU")
        }
        DbError::NotFound { .. } => item_not_found(),
        other => ApiError::from(other),
    })?;

    info!(item_id = id, user_id = user.id, "Item updated");
    Ok(ApiResponse::with_message("Item updated successfully", updated))
}

async fn delete_item(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.db.items().delete(id).await.map_err(|e| match e {
        DbError::InUse { .. } => {
            ApiError::validation("Cannot delete item: It is part of existing sales records")
        }
        DbError::NotFound { .. } => item_not_found(),
        other => ApiError::from(other),
    })?;

    info!(item_id = id, user_id = user.id, "Item deleted");
    Ok(ApiResponse::message("Item deleted successfully"))
}
