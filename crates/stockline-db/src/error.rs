//! # Database Error Types
//!
//! Error types for database operations and the checkout transaction.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├──────────────► CheckoutError::PersistenceFailure               │
//! │       │                (sale rolled back, nothing committed)           │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← Serialized for HTTP clients                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockline_core::CoreError;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - UPDATE / DELETE matched nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting or updating to a duplicate SKU
    /// - Registering an email twice
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Sale referencing a non-existent user
    /// - Line item referencing a non-existent item
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Row is still referenced and cannot be deleted.
    ///
    /// ## When This Occurs
    /// - Deleting an item that appears on past sales
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    InUse {
        entity: String,
        id: String,
        referenced_by: String,
    },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this is a UNIQUE violation on the given `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field == column)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if let Some(field) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    DbError::UniqueViolation {
                        field: field.trim().to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Outcome of a rejected or failed sale.
///
/// Every variant means the transaction was rolled back: no stock moved and
/// no sale rows exist.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No well-formed entries remained after parsing the basket.
    #[error("No valid items in sale")]
    EmptyBasket,

    /// A locked item could not cover the requested quantity, or the item
    /// does not exist. `item` is the display name, or `Item ID <n>` when
    /// the id resolves to nothing.
    #[error("Insufficient stock for {item}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Basket amounts do not fit the money representation.
    #[error("Invalid sale: {0}")]
    Invalid(String),

    /// Any store fault while the transaction was open.
    #[error("Failed to create sale: {0}")]
    PersistenceFailure(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::PersistenceFailure(err.into())
    }
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyBasket => CheckoutError::EmptyBasket,
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                item,
                available,
                requested,
            },
            CoreError::ItemNotFound(id) => CheckoutError::InsufficientStock {
                item: format!("Item ID {}", id),
                available: 0,
                requested: 0,
            },
            CoreError::Validation(e) => CheckoutError::Invalid(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Item", 42);
        assert_eq!(err.to_string(), "Item not found: 42");
    }

    #[test]
    fn test_unique_violation_column_match() {
        let err = DbError::duplicate("items.sku", "PEN-BLU");
        assert!(err.is_unique_violation_on("items.sku"));
        assert!(!err.is_unique_violation_on("users.email"));
    }

    #[test]
    fn test_core_error_maps_to_checkout_error() {
        let err: CheckoutError = CoreError::InsufficientStock {
            item: "Blue Pen".to_string(),
            available: 2,
            requested: 5,
        }
        .into();
        assert_eq!(err.to_string(), "Insufficient stock for Blue Pen");

        let err: CheckoutError = CoreError::EmptyBasket.into();
        assert!(matches!(err, CheckoutError::EmptyBasket));

        let err: CheckoutError = CoreError::ItemNotFound(9).into();
        assert_eq!(err.to_string(), "Insufficient stock for Item ID 9");
    }

    #[test]
    fn test_persistence_failure_wraps_db_error() {
        let err: CheckoutError = DbError::PoolExhausted.into();
        assert!(matches!(
            err,
            CheckoutError::PersistenceFailure(DbError::PoolExhausted)
        ));
    }
}
