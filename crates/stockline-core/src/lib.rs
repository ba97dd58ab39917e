//! # stockline-core: Pure Business Logic for Stockline
//!
//! This crate holds the domain rules of the store as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/auth, /api/items, /api/sales, /api/reports, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockline-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  basket   │  │ validation│  │   │
//! │  │   │   Item    │  │   Money   │  │  Basket   │  │   rules   │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  Pricing  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockline-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, checkout transaction         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Sale, SaleLineItem, User, TaxRate)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`basket`] - Basket parsing, lock ordering and sale pricing
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockline_core::money::Money;
//! use stockline_core::GST_RATE;
//!
//! let subtotal = Money::from_cents(30000); // 300.00
//! let tax = subtotal.calculate_tax(GST_RATE);
//! assert_eq!(tax.cents(), 5400); // 54.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use basket::{
    check_stock, Basket, BasketEntry, PricedLine, RawBasketEntry, SaleTotals, StockDemand,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST applied to every sale subtotal: 18% (1800 basis points).
pub const GST_RATE: TaxRate = TaxRate::from_bps(1800);

/// Number of rows returned by the sales history listing.
pub const SALES_HISTORY_LIMIT: i64 = 100;

/// Number of entries in the dashboard low-stock panel.
pub const LOW_STOCK_LIMIT: i64 = 10;

/// Number of entries in the dashboard recent-sales panel.
pub const RECENT_SALES_LIMIT: i64 = 5;
