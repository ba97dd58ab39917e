//! # Item Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD for catalog management
//! - Low-stock listing for the dashboard
//! - Row locking and guarded decrement for the checkout transaction
//!
//! ## Locking a Row in SQLite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT ... FOR UPDATE. A no-op write that returns the   │
//! │  row gives the same guarantee:                                          │
//! │                                                                         │
//! │    UPDATE items SET quantity = quantity WHERE id = ?1 RETURNING ...    │
//! │                                                                         │
//! │  As the first statement of a transaction it takes the database write   │
//! │  lock. Another transaction doing the same waits (busy_timeout) until   │
//! │  the holder commits or rolls back, then reads the committed quantity.  │
//! │                                                                         │
//! │  Tx A: lock(1) ──► qty 5 ──► decrement 3 ──► COMMIT                    │
//! │  Tx B: lock(1) ·········· waiting ··········► qty 2 ──► reject         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockline_core::validation::{
    validate_item_name, validate_min_stock_level, validate_price_cents, validate_sku,
    validate_stock_quantity,
};
use stockline_core::{Item, ValidationError};

/// Fields accepted when creating or replacing an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock_level: i64,
}

impl NewItem {
    /// Checks every field and returns a trimmed copy.
    ///
    /// An all-whitespace description becomes `None`.
    pub fn validated(&self) -> Result<NewItem, ValidationError> {
        validate_sku(&self.sku)?;
        validate_item_name(&self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock_quantity(self.quantity)?;
        validate_min_stock_level(self.min_stock_level)?;

        Ok(NewItem {
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            price_cents: self.price_cents,
            quantity: self.quantity,
            min_stock_level: self.min_stock_level,
        })
    }
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists every item ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, description, price_cents, quantity,
                   min_stock_level, created_at, updated_at
            FROM items
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = items.len(), "Listed items");
        Ok(items)
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, description, price_cents, quantity,
                   min_stock_level, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Inserted item with its generated id
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, item: &NewItem) -> DbResult<Item> {
        debug!(sku = %item.sku, "Inserting item");

        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                sku, name, description, price_cents, quantity,
                min_stock_level, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id, sku, name, description, price_cents, quantity,
                      min_stock_level, created_at, updated_at
            "#,
        )
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(item.min_stock_level)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    /// Replaces every editable field of an existing item.
    ///
    /// Past sale lines keep their own price snapshot, so a price change here
    /// never alters recorded sales.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Item doesn't exist
    /// * `Err(DbError::UniqueViolation)` - SKU taken by another item
    pub async fn update(&self, id: i64, item: &NewItem) -> DbResult<Item> {
        debug!(id = id, sku = %item.sku, "Updating item");

        let now = Utc::now();

        let updated = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                sku = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                quantity = ?6,
                min_stock_level = ?7,
                updated_at = ?8
            WHERE id = ?1
            RETURNING id, sku, name, description, price_cents, quantity,
                      min_stock_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(item.min_stock_level)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Deletes an item.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Item doesn't exist
    /// * `Err(DbError::InUse)` - Item appears on recorded sales
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::InUse {
                    entity: "Item".to_string(),
                    id: id.to_string(),
                    referenced_by: "sale_items".to_string(),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Items at or below their reorder threshold, lowest quantity first.
    pub async fn low_stock(&self, limit: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, description, price_cents, quantity,
                   min_stock_level, created_at, updated_at
            FROM items
            WHERE quantity <= min_stock_level
            ORDER BY quantity ASC, id ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts catalog items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction Primitives (checkout)
    // =========================================================================

    /// Locks an item row for the rest of the transaction and returns it.
    ///
    /// `conn` must be an open transaction; outside one the lock is released
    /// as soon as the statement finishes.
    ///
    /// ## Returns
    /// * `Ok(None)` - No item with this id
    pub async fn get_item_for_update(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Item>> {
        debug!(id = id, "Locking item");

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET quantity = quantity
            WHERE id = ?1
            RETURNING id, sku, name, description, price_cents, quantity,
                      min_stock_level, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Takes `amount` units off an item's shelf count.
    ///
    /// Guarded by `quantity >= amount`: a decrement that would go negative
    /// matches no row and fails instead of applying.
    pub async fn decrement_quantity(
        conn: &mut SqliteConnection,
        id: i64,
        amount: i64,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = id, amount = amount, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity - ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::QueryFailed(format!(
                "stock guard rejected decrement of {} for item {}",
                amount, id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn notebook() -> NewItem {
        NewItem {
            sku: "NB-A5".to_string(),
            name: "Notebook A5".to_string(),
            description: Some("Ruled, 200 pages".to_string()),
            price_cents: 10000,
            quantity: 10,
            min_stock_level: 3,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_new_item_validated_trims() {
        let raw = NewItem {
            sku: " NB-A5 ".to_string(),
            name: "  Notebook ".to_string(),
            description: Some("   ".to_string()),
            ..notebook()
        };
        let clean = raw.validated().unwrap();
        assert_eq!(clean.sku, "NB-A5");
        assert_eq!(clean.name, "Notebook");
        assert_eq!(clean.description, None);

        let bad = NewItem {
            price_cents: -1,
            ..notebook()
        };
        assert!(bad.validated().is_err());
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.items();

        let item = repo.insert(&notebook()).await.unwrap();
        assert!(item.id > 0);
        assert_eq!(item.quantity, 10);

        let fetched = repo.get_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "NB-A5");
        assert_eq!(fetched.description.as_deref(), Some("Ruled, 200 pages"));
        assert!(repo.get_by_id(item.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let db = test_db().await;
        let repo = db.items();

        repo.insert(&notebook()).await.unwrap();
        let err = repo.insert(&notebook()).await.unwrap_err();
        assert!(err.is_unique_violation_on("items.sku"), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_conflicting_sku() {
        let db = test_db().await;
        let repo = db.items();

        repo.insert(&notebook()).await.unwrap();
        let pen = repo
            .insert(&NewItem {
                sku: "PEN-BLU".to_string(),
                name: "Blue Pen".to_string(),
                ..notebook()
            })
            .await
            .unwrap();

        let err = repo.update(pen.id, &notebook()).await.unwrap_err();
        assert!(err.is_unique_violation_on("items.sku"));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let db = test_db().await;
        let repo = db.items();

        assert!(matches!(
            repo.update(999, &notebook()).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.delete(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_and_low_stock() {
        let db = test_db().await;
        let repo = db.items();

        repo.insert(&NewItem {
            sku: "ZIP".to_string(),
            name: "Zip Bag".to_string(),
            quantity: 1,
            min_stock_level: 5,
            ..notebook()
        })
        .await
        .unwrap();
        repo.insert(&notebook()).await.unwrap();
        repo.insert(&NewItem {
            sku: "ERASER".to_string(),
            name: "Eraser".to_string(),
            quantity: 0,
            min_stock_level: 0,
            ..notebook()
        })
        .await
        .unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Eraser", "Notebook A5", "Zip Bag"]);

        let low: Vec<String> = repo
            .low_stock(10)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.sku)
            .collect();
        assert_eq!(low, vec!["ERASER", "ZIP"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lock_and_guarded_decrement() {
        let db = test_db().await;
        let item = db.items().insert(&notebook()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let locked = ItemRepository::get_item_for_update(&mut *tx, item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(locked.quantity, 10);
        assert!(ItemRepository::get_item_for_update(&mut *tx, 12345)
            .await
            .unwrap()
            .is_none());

        ItemRepository::decrement_quantity(&mut *tx, item.id, 4, Utc::now())
            .await
            .unwrap();
        let over = ItemRepository::decrement_quantity(&mut *tx, item.id, 7, Utc::now()).await;
        assert!(over.is_err());
        tx.commit().await.unwrap();

        let after = db.items().get_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 6);
    }
}
