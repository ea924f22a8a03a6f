/// Migration verification tests
use super::test_helpers::setup_test_db;
use sqlx::Row;

#[tokio::test]
async fn test_migrations_create_all_tables() {
    let db = setup_test_db().await;

    let rows = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table'
         AND name NOT IN ('sqlite_sequence', '_sqlx_migrations') ORDER BY name",
    )
    .fetch_all(db.pool())
    .await
    .expect("Failed to query tables");

    let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
    assert_eq!(
        names,
        vec![
            "cart_items",
            "carts",
            "collections",
            "conditions",
            "order_items",
            "order_status_history",
            "orders",
            "product_media",
            "product_tags",
            "product_types",
            "products",
            "shipping_addresses",
            "stores",
            "tags",
        ]
    );
}

#[tokio::test]
async fn test_foreign_keys_enabled() {
    let db = setup_test_db().await;
    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(db.pool())
        .await
        .expect("Failed to read pragma");
    assert_eq!(enabled, 1);
}

#[test]
fn test_migration_path_from_crate_root() {
    for migration in ["001_schema.sql", "002_shipping_addresses.sql"] {
        let path = format!("{}/migrations/{}", env!("CARGO_MANIFEST_DIR"), migration);
        assert!(
            std::path::Path::new(&path).exists(),
            "Migration should exist at: {}",
            path
        );
    }
}
