//! Checkout engine against a real on-disk SQLite database.
//!
//! A temporary file (not `:memory:`) is used so the pool holds several
//! connections and concurrent sales really contend for the write lock.

use std::time::Duration;

use serde_json::json;
use stockline_core::{Item, RawBasketEntry, UserRole};
use stockline_db::{CheckoutError, Customer, Database, DbConfig, NewItem, NewUser};
use tempfile::TempDir;

struct Fixture {
    db: Database,
    user_id: i64,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("stockline.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();

    let user = db
        .users()
        .insert(&NewUser {
            username: "cashier".to_string(),
            email: "cashier@shop.example".to_string(),
            password_hash: "$argon2id$v=19$placeholder".to_string(),
            role: UserRole::Staff,
        })
        .await
        .unwrap();

    Fixture {
        db,
        user_id: user.id,
        _dir: dir,
    }
}

async fn add_item(db: &Database, sku: &str, name: &str, price_cents: i64, quantity: i64) -> Item {
    db.items()
        .insert(&NewItem {
            sku: sku.to_string(),
            name: name.to_string(),
            description: None,
            price_cents,
            quantity,
            min_stock_level: 0,
        })
        .await
        .unwrap()
}

async fn stock_of(db: &Database, id: i64) -> i64 {
    db.items().get_by_id(id).await.unwrap().unwrap().quantity
}

fn entry(item_id: i64, quantity: i64) -> RawBasketEntry {
    RawBasketEntry::new(item_id, quantity)
}

#[tokio::test]
async fn sale_prices_taxes_and_decrements() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 10).await;

    let receipt = f
        .db
        .checkout()
        .create_sale(f.user_id, &[entry(notebook.id, 3)], Customer::default())
        .await
        .unwrap();

    assert_eq!(receipt.subtotal.cents(), 30000);
    assert_eq!(receipt.tax.cents(), 5400);
    assert_eq!(receipt.total.cents(), 35400);
    assert_eq!(stock_of(&f.db, notebook.id).await, 7);

    let sale = f.db.sales().get_by_id(receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.user_id, f.user_id);
    assert_eq!(sale.total_cents, sale.subtotal_cents + sale.tax_cents);
    assert_eq!(sale.customer_name, None);

    let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line.quantity, 3);
    assert_eq!(lines[0].line.unit_price_cents, 10000);
    assert_eq!(lines[0].line.line_total_cents, 30000);
    assert_eq!(lines[0].name.as_deref(), Some("Notebook A5"));
}

#[tokio::test]
async fn insufficient_stock_changes_nothing() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 10).await;
    let pen = add_item(&f.db, "PEN-BLU", "Blue Pen", 500, 2).await;

    let err = f
        .db
        .checkout()
        .create_sale(
            f.user_id,
            &[entry(notebook.id, 1), entry(pen.id, 5)],
            Customer::default(),
        )
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            item,
            available,
            requested,
        } => {
            assert_eq!(item, "Blue Pen");
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(stock_of(&f.db, notebook.id).await, 10);
    assert_eq!(stock_of(&f.db, pen.id).await, 2);
    assert_eq!(f.db.sales().count().await.unwrap(), 0);
}

async fn line_item_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn storage_fault_after_locking_rolls_back() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 5).await;

    // No such staff account: the sale header violates its foreign key
    let err = f
        .db
        .checkout()
        .create_sale(9999, &[entry(notebook.id, 2)], Customer::default())
        .await
        .unwrap_err();

    assert!(
        matches!(err, CheckoutError::PersistenceFailure(_)),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(stock_of(&f.db, notebook.id).await, 5);
    assert_eq!(f.db.sales().count().await.unwrap(), 0);
    assert_eq!(line_item_count(&f.db).await, 0);
}

#[tokio::test]
async fn total_overflow_is_rejected_without_changes() {
    let f = fixture().await;
    let vault = add_item(&f.db, "VAULT-1", "Vault", 8_000_000_000_000_000_000, 3).await;

    let err = f
        .db
        .checkout()
        .create_sale(f.user_id, &[entry(vault.id, 1)], Customer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Invalid(_)), "unexpected error: {:?}", err);
    assert_eq!(stock_of(&f.db, vault.id).await, 3);
    assert_eq!(f.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_item_is_reported_by_id() {
    let f = fixture().await;

    let err = f
        .db
        .checkout()
        .create_sale(f.user_id, &[entry(4242, 1)], Customer::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Insufficient stock for Item ID 4242");
    assert_eq!(f.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn zero_quantity_entry_is_dropped() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 10).await;
    let pen = add_item(&f.db, "PEN-BLU", "Blue Pen", 500, 5).await;

    let receipt = f
        .db
        .checkout()
        .create_sale(
            f.user_id,
            &[entry(notebook.id, 0), entry(pen.id, 2)],
            Customer::default(),
        )
        .await
        .unwrap();

    assert_eq!(receipt.lines.len(), 1);
    assert_eq!(receipt.lines[0].item_id, pen.id);
    assert_eq!(receipt.subtotal.cents(), 1000);
    assert_eq!(stock_of(&f.db, notebook.id).await, 10);
    assert_eq!(stock_of(&f.db, pen.id).await, 3);
}

#[tokio::test]
async fn malformed_basket_is_empty() {
    let f = fixture().await;

    let raw = vec![
        RawBasketEntry::new(json!("abc"), json!(1)),
        RawBasketEntry::new(json!(1), json!("-3")),
    ];
    let err = f
        .db
        .checkout()
        .create_sale(f.user_id, &raw, Customer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyBasket));
    assert_eq!(f.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn lines_follow_basket_order_and_customer_is_kept() {
    let f = fixture().await;
    let a = add_item(&f.db, "A-1", "Alpha", 100, 10).await;
    let b = add_item(&f.db, "B-1", "Bravo", 250, 10).await;

    let receipt = f
        .db
        .checkout()
        .create_sale(
            f.user_id,
            &[entry(b.id, 1), entry(a.id, 2)],
            Customer::new(Some("Ayesha".to_string()), Some("0300-1234567".to_string())),
        )
        .await
        .unwrap();

    let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
    let order: Vec<i64> = lines.iter().map(|l| l.line.item_id).collect();
    assert_eq!(order, vec![b.id, a.id]);

    let line_sum: i64 = lines.iter().map(|l| l.line.line_total_cents).sum();
    assert_eq!(line_sum, receipt.subtotal.cents());

    let sale = f.db.sales().get_by_id(receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.customer_name.as_deref(), Some("Ayesha"));
    assert_eq!(sale.customer_phone.as_deref(), Some("0300-1234567"));
}

#[tokio::test]
async fn repeated_item_is_checked_against_total_quantity() {
    let f = fixture().await;
    let pen = add_item(&f.db, "PEN-BLU", "Blue Pen", 500, 4).await;

    let err = f
        .db
        .checkout()
        .create_sale(
            f.user_id,
            &[entry(pen.id, 3), entry(pen.id, 3)],
            Customer::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { requested: 6, .. }));
    assert_eq!(stock_of(&f.db, pen.id).await, 4);

    let receipt = f
        .db
        .checkout()
        .create_sale(
            f.user_id,
            &[entry(pen.id, 1), entry(pen.id, 3)],
            Customer::default(),
        )
        .await
        .unwrap();
    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(stock_of(&f.db, pen.id).await, 0);
}

#[tokio::test]
async fn price_snapshot_survives_catalog_update() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 10).await;

    let receipt = f
        .db
        .checkout()
        .create_sale(f.user_id, &[entry(notebook.id, 1)], Customer::default())
        .await
        .unwrap();

    f.db
        .items()
        .update(
            notebook.id,
            &NewItem {
                sku: "NB-A5".to_string(),
                name: "Notebook A5 (new cover)".to_string(),
                description: None,
                price_cents: 12500,
                quantity: 9,
                min_stock_level: 0,
            },
        )
        .await
        .unwrap();

    let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
    assert_eq!(lines[0].line.unit_price_cents, 10000);
    assert_eq!(lines[0].name.as_deref(), Some("Notebook A5 (new cover)"));

    let sale = f.db.sales().get_by_id(receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.subtotal_cents, 10000);
}

#[tokio::test]
async fn item_on_a_sale_cannot_be_deleted() {
    let f = fixture().await;
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 10).await;

    f.db
        .checkout()
        .create_sale(f.user_id, &[entry(notebook.id, 1)], Customer::default())
        .await
        .unwrap();

    let err = f.db.items().delete(notebook.id).await.unwrap_err();
    assert!(matches!(err, stockline_db::DbError::InUse { .. }));
    assert!(f.db.items().get_by_id(notebook.id).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_sales_never_oversell() {
    let f = fixture().await;
    // 2Q > S >= Q with Q = 3, S = 5
    let notebook = add_item(&f.db, "NB-A5", "Notebook A5", 10000, 5).await;

    let first = f.db.checkout();
    let second = f.db.checkout();
    let basket = vec![entry(notebook.id, 3)];

    let (a, b) = tokio::join!(
        first.create_sale(f.user_id, &basket, Customer::default()),
        second.create_sale(f.user_id, &basket, Customer::default()),
    );

    let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1, "a = {:?}, b = {:?}", a.err(), b.err());
    assert_eq!(stock_of(&f.db, notebook.id).await, 2);
    assert_eq!(f.db.sales().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn opposite_basket_orders_both_complete() {
    let f = fixture().await;
    let a = add_item(&f.db, "A-1", "Alpha", 100, 10).await;
    let b = add_item(&f.db, "B-1", "Bravo", 250, 10).await;

    let engine = f.db.checkout();
    let mut handles = Vec::new();
    for n in 0..6 {
        let engine = engine.clone();
        let user_id = f.user_id;
        let basket = if n % 2 == 0 {
            vec![entry(a.id, 1), entry(b.id, 1)]
        } else {
            vec![entry(b.id, 1), entry(a.id, 1)]
        };
        handles.push(tokio::spawn(async move {
            engine.create_sale(user_id, &basket, Customer::default()).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(stock_of(&f.db, a.id).await, 4);
    assert_eq!(stock_of(&f.db, b.id).await, 4);
    assert_eq!(f.db.sales().count().await.unwrap(), 6);
}
