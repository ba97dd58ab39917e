//! # Stockline API
//!
//! JSON HTTP server for the shop front end: staff login, catalog
//! management, checkout, dashboard and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Routes                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/auth     │  │  /api/items    │  │  /api/sales                ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • list / get   │  │ • create (checkout engine) ││
//! │  │ • register  🔒 │  │ • create       │  │ • list (latest 100)        ││
//! │  │ • verify    🔒 │  │ • update/delete│  │ • get with lines           ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │ /api/dashboard │  │  /api/reports  │  │  /health       │            │
//! │  │ • metrics      │  │ • daily        │  │ (public)       │            │
//! │  │                │  │ • export (CSV) │  │                │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  Every /api route except login requires `Authorization: Bearer ...`    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 3000)
//! - `DATABASE_PATH` - SQLite file (default: ./data/stockline.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 10)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_LIFETIME_SECS` - Token lifetime (default: 86400)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_USERNAME` - first admin account

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use stockline_core::UserRole;
use stockline_db::{Database, NewUser};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState { db, jwt, config }
    }
}

/// Builds the full router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/auth", handlers::auth::routes())
        .nest("/items", handlers::items::routes())
        .nest("/sales", handlers::sales::routes())
        .nest("/dashboard", handlers::dashboard::routes())
        .nest("/reports", handlers::reports::routes());

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Creates the configured admin account when the user table is empty.
///
/// Returns `true` if an account was created.
pub async fn bootstrap_admin(state: &AppState) -> anyhow::Result<bool> {
    let Some(admin) = state.config.admin.as_ref() else {
        return Ok(false);
    };

    if state.db.users().count().await? > 0 {
        return Ok(false);
    }

    stockline_core::validation::validate_password(&admin.password)?;
    stockline_core::validation::validate_email(&admin.email)?;

    let password_hash = auth::hash_password_blocking(&admin.password).await?;
    let user = state
        .db
        .users()
        .insert(&NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: UserRole::Admin,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "Admin account created");
    Ok(true)
}
