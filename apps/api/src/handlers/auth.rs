//! Login, staff registration and token verification.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockline_core::validation::{validate_email, validate_password, validate_username};
use stockline_core::{User, UserRole};
use stockline_db::NewUser;
use tracing::{info, warn};

use super::{ApiResponse, Created};
use crate::auth::{hash_password_blocking, verify_password_blocking, AuthUser, Claims};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/verify", get(verify))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: User,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginData>>> {
    let user = match state.db.users().get_by_email(&req.email).await? {
        Some(user) => {
            let verified = verify_password_blocking(&req.password, &user.password_hash).await;
            verified.then_some(user)
        }
        None => None,
    };
    let Some(user) = user else {
        warn!(email = %req.email.trim(), "Login failed");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, "Login successful");

    Ok(ApiResponse::with_message(
        "Login successful",
        LoginData { token, user },
    ))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

async fn register(
    caller: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<Created>>> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => UserRole::Staff,
        Some(name) => UserRole::parse(name)
            .ok_or_else(|| ApiError::validation("role must be one of: admin, staff"))?,
    };

    if state.db.users().get_by_email(&req.email).await?.is_some() {
        return Err(ApiError::validation("Email is already registered"));
    }

    let username = req.username.trim().to_string();
    let password_hash = hash_password_blocking(&req.password).await?;
    let user = state
        .db
        .users()
        .insert(&NewUser {
            username: username.clone(),
            email: req.email.trim().to_string(),
            password_hash,
            role,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_on("users.email") {
                ApiError::validation("Email is already registered")
            } else {
                ApiError::from(e)
            }
        })?;

    info!(
        user_id = user.id,
        created_by = caller.id,
        role = role.as_str(),
        "Staff account created"
    );

    Ok(ApiResponse::with_message(
        format!("Staff account for {} created successfully", username),
        Created { id: user.id },
    ))
}

async fn verify(caller: AuthUser) -> Json<ApiResponse<Claims>> {
    ApiResponse::data(caller.claims)
}
