//! # Repository Module
//!
//! Database repository implementations for Stockline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.items().get_by_id(7)                                       │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── list / get_by_id / insert / update / delete      (pool)           │
//! │  └── get_item_for_update / decrement_quantity         (transaction)    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Methods taking `&self` run on the pool. Associated functions taking   │
//! │  `&mut SqliteConnection` run inside the caller's transaction.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Catalog CRUD, low stock, row locks
//! - [`SaleRepository`](sale::SaleRepository) - Sale headers and line items
//! - [`UserRepository`](user::UserRepository) - Staff accounts
//! - [`ReportRepository`](report::ReportRepository) - Dashboard and reports

pub mod item;
pub mod report;
pub mod sale;
pub mod user;
