use crate::database::products::ProductUpdate;
use crate::database::test_helpers::{sample_product, sample_store, setup_test_db};
use rust_decimal::Decimal;
use storefront_common::MediaKind;

#[tokio::test]
async fn test_create_product_with_type_and_tags() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;

    let mut new = sample_product("Disney Fabric");
    new.product_type = Some("Cotton".to_string());
    new.tags = vec!["Sale".to_string(), " new ".to_string(), "SALE".to_string()];
    let product = db.create_product(store.id, new).await.unwrap();

    assert_eq!(product.title, "Disney Fabric");
    assert_eq!(product.product_type.as_deref(), Some("Cotton"));
    assert_eq!(product.price_cents, 500);
    assert_eq!(product.price, "5.00");
    assert_eq!(product.tags, vec!["new".to_string(), "Sale".to_string()]);
}

#[tokio::test]
async fn test_product_types_are_case_insensitive_per_store() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let other = sample_store(&db, "Other").await;

    let a = db.create_product_type(store.id, "Cotton").await.unwrap();
    let b = db.create_product_type(store.id, "COTTON").await.unwrap();
    let c = db.create_product_type(other.id, "cotton").await.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(b.name, "Cotton");
    assert_ne!(a.id, c.id);
    assert_eq!(db.list_product_types(store.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_validation() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;

    let mut negative_stock = sample_product("Bad");
    negative_stock.stock = -1;
    assert!(db.create_product(store.id, negative_stock).await.is_err());

    let mut negative_price = sample_product("Bad");
    negative_price.price = Decimal::new(-100, 2);
    assert!(db.create_product(store.id, negative_price).await.is_err());

    let mut fine_price = sample_product("Bad");
    fine_price.price = Decimal::new(1005, 3);
    let err = db.create_product(store.id, fine_price).await.unwrap_err();
    assert!(err.to_string().contains("decimal places"));

    assert!(db.create_product(store.id, sample_product("  ")).await.is_err());

    // Trailing zeros beyond two places are still whole cents
    let mut padded = sample_product("Padded");
    padded.price = Decimal::new(15150, 3);
    let product = db.create_product(store.id, padded).await.unwrap();
    assert_eq!(product.price_cents, 1515);
}

#[tokio::test]
async fn test_update_product() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let mut new = sample_product("Plain");
    new.product_type = Some("Cotton".to_string());
    let product = db.create_product(store.id, new).await.unwrap();

    let updated = db
        .update_product(
            product.id,
            ProductUpdate {
                title: Some("Patterned".to_string()),
                price: Some(Decimal::new(1250, 2)),
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Patterned");
    assert_eq!(updated.price_cents, 1250);
    assert_eq!(updated.stock, 0);
    assert_eq!(updated.product_type.as_deref(), Some("Cotton"));

    let untyped = db
        .update_product(
            product.id,
            ProductUpdate {
                product_type: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(untyped.product_type.is_none());

    let err = db
        .update_product(
            product.id,
            ProductUpdate {
                stock: Some(-5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("negative"));
}

#[tokio::test]
async fn test_set_product_tags_replaces() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let mut new = sample_product("Tagged");
    new.tags = vec!["a".to_string(), "b".to_string()];
    let product = db.create_product(store.id, new).await.unwrap();

    db.set_product_tags(product.id, &["C".to_string()])
        .await
        .unwrap();
    let reloaded = db.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(reloaded.tags, vec!["C".to_string()]);

    assert!(db.set_product_tags(999, &[]).await.is_err());
}

#[tokio::test]
async fn test_list_visible_products() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let other = sample_store(&db, "Other").await;

    let visible = db
        .create_product(store.id, sample_product("Visible"))
        .await
        .unwrap();

    let mut hidden = sample_product("Hidden");
    hidden.published = false;
    db.create_product(store.id, hidden).await.unwrap();

    let mut future = sample_product("Future");
    future.date_available_ns = 2_000;
    let future = db.create_product(store.id, future).await.unwrap();

    db.create_product(other.id, sample_product("Elsewhere"))
        .await
        .unwrap();

    let ids: Vec<i64> = db
        .list_visible_products(&store.slug, 1_000)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![visible.id]);

    let ids: Vec<i64> = db
        .list_visible_products(&store.slug, 2_000)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![visible.id, future.id]);

    assert_eq!(db.list_store_products(store.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_first_media_becomes_primary() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let product = db
        .create_product(store.id, sample_product("Pictured"))
        .await
        .unwrap();

    let first = db
        .add_product_media(product.id, MediaKind::Image, "a.png", false)
        .await
        .unwrap();
    assert!(first.is_primary);

    let second = db
        .add_product_media(product.id, MediaKind::Image, "b.png", false)
        .await
        .unwrap();
    assert!(!second.is_primary);

    // Attachments track their own primary
    let doc = db
        .add_product_media(product.id, MediaKind::Attachment, "care.pdf", false)
        .await
        .unwrap();
    assert!(doc.is_primary);
}

#[tokio::test]
async fn test_new_primary_media_demotes_previous() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let product = db
        .create_product(store.id, sample_product("Pictured"))
        .await
        .unwrap();

    let first = db
        .add_product_media(product.id, MediaKind::Image, "a.png", true)
        .await
        .unwrap();
    let second = db
        .add_product_media(product.id, MediaKind::Image, "b.png", true)
        .await
        .unwrap();

    let images = db
        .list_product_media(product.id, MediaKind::Image)
        .await
        .unwrap();
    let primaries: Vec<i64> = images.iter().filter(|m| m.is_primary).map(|m| m.id).collect();
    assert_eq!(primaries, vec![second.id]);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_deleting_primary_media_promotes_oldest() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let product = db
        .create_product(store.id, sample_product("Pictured"))
        .await
        .unwrap();

    let a = db
        .add_product_media(product.id, MediaKind::Image, "a.png", false)
        .await
        .unwrap();
    let b = db
        .add_product_media(product.id, MediaKind::Image, "b.png", false)
        .await
        .unwrap();
    let c = db
        .add_product_media(product.id, MediaKind::Image, "c.png", true)
        .await
        .unwrap();

    db.delete_product_media(c.id).await.unwrap();

    let images = db
        .list_product_media(product.id, MediaKind::Image)
        .await
        .unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().find(|m| m.id == a.id).unwrap().is_primary);
    assert!(!images.iter().find(|m| m.id == b.id).unwrap().is_primary);

    assert!(db.delete_product_media(c.id).await.is_err());
}

#[tokio::test]
async fn test_large_result_sets_load_tags() {
    use crate::database::test_helpers::OWNER;
    use storefront_common::{CombinationMode, Condition, FieldReference, FilterType};

    const COUNT: i64 = 33_000;
    let db = setup_test_db().await;
    let store = sample_store(&db, "Warehouse").await;

    sqlx::query(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?)
         INSERT INTO products (store_id, title, title_folded, price_cents, stock, published,
                               date_available_ns, created_at_ns, updated_at_ns)
         SELECT ?, 'Bolt ' || n, 'bolt ' || n, 100, n % 7, 1, 0, 0, 0 FROM seq",
    )
    .bind(COUNT)
    .bind(store.id)
    .execute(db.pool())
    .await
    .unwrap();

    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM products WHERE store_id = ? ORDER BY id")
        .bind(store.id)
        .fetch_all(db.pool())
        .await
        .unwrap();
    let first = ids[0];
    let last = ids[ids.len() - 1];
    db.set_product_tags(first, &["Sale".to_string()]).await.unwrap();
    db.set_product_tags(last, &["Clearance".to_string()]).await.unwrap();

    let collection = db
        .create_collection(store.id, OWNER, "Everything", CombinationMode::All)
        .await
        .unwrap();
    db.add_condition(
        collection.id,
        OWNER,
        Condition::new(FieldReference::Stock, FilterType::GreaterOrEqual, "0"),
    )
    .await
    .unwrap();

    let matched = db.get_collection_products(collection.id, 1).await.unwrap();
    assert_eq!(matched.len() as i64, COUNT);
    assert_eq!(matched[0].tags, vec!["Sale".to_string()]);
    assert_eq!(matched[matched.len() - 1].tags, vec!["Clearance".to_string()]);
    assert!(matched[1].tags.is_empty());

    let visible = db.list_visible_products(&store.slug, 1).await.unwrap();
    assert_eq!(visible.len() as i64, COUNT);
    assert_eq!(visible[visible.len() - 1].id, last);

    let all = db.list_store_products(store.id).await.unwrap();
    assert_eq!(all.len() as i64, COUNT);
}
