use crate::database::test_helpers::{sample_store, setup_test_db, OWNER};

#[tokio::test]
async fn test_create_store_derives_slug() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Cino Labs Fabric").await;

    assert_eq!(store.slug, "cino-labs-fabric");
    assert_eq!(store.owner_id, OWNER);
    assert!(!store.is_active);
    assert!(store.logo_path.is_none());
    assert!(uuid::Uuid::parse_str(&store.uuid).is_ok());
}

#[tokio::test]
async fn test_duplicate_titles_get_suffixed_slugs() {
    let db = setup_test_db().await;
    let first = sample_store(&db, "Quilt Shop").await;
    let second = sample_store(&db, "Quilt Shop").await;
    let third = sample_store(&db, "quilt shop!").await;

    assert_eq!(first.slug, "quilt-shop");
    assert_eq!(second.slug, "quilt-shop-2");
    assert_eq!(third.slug, "quilt-shop-3");
}

#[tokio::test]
async fn test_store_title_validation() {
    let db = setup_test_db().await;

    let err = db.create_store(OWNER, "   ").await.unwrap_err();
    assert!(err.to_string().contains("cannot be empty"));

    let long = "x".repeat(36);
    let err = db.create_store(OWNER, &long).await.unwrap_err();
    assert!(err.to_string().contains("too long"));

    let exact = "y".repeat(35);
    assert!(db.create_store(OWNER, &exact).await.is_ok());
}

#[tokio::test]
async fn test_get_store_by_slug_and_list() {
    let db = setup_test_db().await;
    let a = sample_store(&db, "Alpha").await;
    let b = sample_store(&db, "Beta").await;

    let found = db.get_store_by_slug("beta").await.unwrap().unwrap();
    assert_eq!(found.id, b.id);
    assert!(db.get_store_by_slug("gamma").await.unwrap().is_none());

    let ids: Vec<i64> = db.list_stores().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn test_update_store_title_reslugs() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Old Name").await;

    let updated = db
        .update_store_title(store.id, OWNER, "New Name")
        .await
        .unwrap();
    assert_eq!(updated.title, "New Name");
    assert_eq!(updated.slug, "new-name");

    // Renaming to the same title keeps the slug instead of suffixing it
    let same = db
        .update_store_title(store.id, OWNER, "New Name")
        .await
        .unwrap();
    assert_eq!(same.slug, "new-name");
}

#[tokio::test]
async fn test_only_owner_can_modify_store() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Guarded").await;

    let err = db
        .update_store_title(store.id, "intruder", "Taken")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unauthorized"));

    assert!(db.set_store_active(store.id, "intruder", true).await.is_err());
    db.set_store_active(store.id, OWNER, true).await.unwrap();
    assert!(db.get_store(store.id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_set_store_logo_path() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Logos").await;

    let path = db.set_store_logo(store.id, OWNER, "logo.png").await.unwrap();
    assert!(path.starts_with(&format!("uploads/{}/", store.uuid)));
    assert!(path.ends_with(".png"));

    let reloaded = db.get_store(store.id).await.unwrap().unwrap();
    assert_eq!(reloaded.logo_path.as_deref(), Some(path.as_str()));
}

#[tokio::test]
async fn test_missing_store() {
    let db = setup_test_db().await;
    assert!(db.get_store(42).await.unwrap().is_none());
    let err = db.update_store_title(42, OWNER, "x").await.unwrap_err();
    assert_eq!(err.to_string(), "Store not found");
}
