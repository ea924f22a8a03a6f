/// Shared test helpers for database tests
use super::products::NewProduct;
use super::stores::Store;
use super::Database;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub const OWNER: &str = "owner@cinolabs.com";

/// Set up an in-memory test database with all migrations applied.
/// The pool holds a single connection so every query sees the same database.
pub async fn setup_test_db() -> Database {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid in-memory database URL")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    Database::from_pool(pool).await.expect("Migration failed")
}

pub async fn sample_store(db: &Database, title: &str) -> Store {
    db.create_store(OWNER, title)
        .await
        .expect("Failed to create sample store")
}

/// Published, available, untyped product priced 5.00 with 3 in stock
pub fn sample_product(title: &str) -> NewProduct {
    NewProduct {
        title: title.to_string(),
        product_type: None,
        price: Decimal::new(500, 2),
        stock: 3,
        published: true,
        date_available_ns: 0,
        tags: Vec::new(),
    }
}
