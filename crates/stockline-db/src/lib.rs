//! # stockline-db: Database Layer for Stockline
//!
//! This crate provides database access for Stockline. It uses SQLite with
//! sqlx for async operations and owns the sale transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockline-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ item / sale / │    │  (embedded)  │  │   │
//! │  │   │               │    │ user / report │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│               │    │ 001_init.sql │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼─────────────────────────────┐                      │   │
//! │  │   │  CheckoutEngine (checkout.rs)       │                      │   │
//! │  │   │  lock → validate → decrement →      │                      │   │
//! │  │   │  insert sale + lines → commit       │                      │   │
//! │  │   └─────────────────────────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                    ./data/stockline.db                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and checkout error types
//! - [`checkout`] - The atomic sale transaction
//! - [`repository`] - Repository implementations (item, sale, user, report)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockline_db::{Database, DbConfig};
//! use stockline_core::{Basket, BasketEntry};
//!
//! let db = Database::new(DbConfig::new("./data/stockline.db")).await?;
//!
//! let basket = Basket::new(vec![BasketEntry { item_id: 1, quantity: 3 }])?;
//! let receipt = db.checkout().execute(user_id, &basket, Default::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutEngine, Customer, SaleReceipt};
pub use error::{CheckoutError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::item::{ItemRepository, NewItem};
pub use repository::report::{
    DailySales, Dashboard, DashboardMetrics, ExportRow, ReportPeriod, ReportRepository,
};
pub use repository::sale::SaleRepository;
pub use repository::user::{NewUser, UserRepository};
