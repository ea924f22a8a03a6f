use crate::database::collections::CollectionUpdate;
use crate::database::test_helpers::{sample_product, sample_store, setup_test_db, OWNER};
use storefront_common::{CombinationMode, Condition, ConditionError, FieldReference, FilterType};

#[tokio::test]
async fn test_create_and_list_collections() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let other = sample_store(&db, "Other").await;

    let sale = db
        .create_collection(store.id, OWNER, "Summer Sale", CombinationMode::Any)
        .await
        .unwrap();
    let sale_again = db
        .create_collection(store.id, OWNER, "Summer Sale", CombinationMode::All)
        .await
        .unwrap();
    let elsewhere = db
        .create_collection(other.id, OWNER, "Summer Sale", CombinationMode::All)
        .await
        .unwrap();

    assert_eq!(sale.slug, "summer-sale");
    assert_eq!(sale.mode, CombinationMode::Any);
    assert_eq!(sale_again.slug, "summer-sale-2");
    // Slugs are unique per store only
    assert_eq!(elsewhere.slug, "summer-sale");

    let listed = db.list_collections(&store.slug).await.unwrap();
    assert_eq!(listed, vec![sale, sale_again]);
    assert!(db.list_collections("missing").await.is_err());
}

#[tokio::test]
async fn test_collection_requires_store_owner() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;

    let err = db
        .create_collection(store.id, "intruder", "Nope", CombinationMode::All)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unauthorized"));

    let collection = db
        .create_collection(store.id, OWNER, "Mine", CombinationMode::All)
        .await
        .unwrap();
    assert!(db.delete_collection(collection.id, "intruder").await.is_err());
    assert!(db
        .add_condition(
            collection.id,
            "intruder",
            Condition::new(FieldReference::Tag, FilterType::Equal, "x"),
        )
        .await
        .is_err());
}

#[tokio::test]
async fn test_update_collection_title_and_mode() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let collection = db
        .create_collection(store.id, OWNER, "Cotton", CombinationMode::All)
        .await
        .unwrap();

    let updated = db
        .update_collection(
            collection.id,
            OWNER,
            CollectionUpdate {
                mode: Some(CombinationMode::Any),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.mode, CombinationMode::Any);
    assert_eq!(updated.slug, "cotton");

    let renamed = db
        .update_collection(
            collection.id,
            OWNER,
            CollectionUpdate {
                title: Some("Cotton Prints".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Cotton Prints");
    assert_eq!(renamed.slug, "cotton-prints");
    assert_eq!(renamed.mode, CombinationMode::Any);
}

#[tokio::test]
async fn test_invalid_condition_is_rejected_and_not_stored() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let collection = db
        .create_collection(store.id, OWNER, "Cheap", CombinationMode::All)
        .await
        .unwrap();

    let err = db
        .add_condition(
            collection.id,
            OWNER,
            Condition::new(FieldReference::Price, FilterType::Contains, "5"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConditionError>(),
        Some(ConditionError::InvalidOperator { .. })
    ));

    let err = db
        .add_condition(
            collection.id,
            OWNER,
            Condition::new(FieldReference::Stock, FilterType::GreaterOrEqual, "lots"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConditionError>(),
        Some(ConditionError::InvalidValue { .. })
    ));

    assert!(db.list_conditions(collection.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conditions_listed_by_field_then_creation() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let collection = db
        .create_collection(store.id, OWNER, "Mixed", CombinationMode::All)
        .await
        .unwrap();

    for (field, value) in [
        (FieldReference::Price, "5"),
        (FieldReference::Tag, "sale"),
        (FieldReference::Type, "cotton"),
        (FieldReference::Tag, "new"),
    ] {
        db.add_condition(
            collection.id,
            OWNER,
            Condition::new(field, FilterType::Equal, value),
        )
        .await
        .unwrap();
    }

    let listed: Vec<(FieldReference, String)> = db
        .list_conditions(collection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.condition.field_reference, c.condition.field_val))
        .collect();
    assert_eq!(
        listed,
        vec![
            (FieldReference::Type, "cotton".to_string()),
            (FieldReference::Tag, "sale".to_string()),
            (FieldReference::Tag, "new".to_string()),
            (FieldReference::Price, "5".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_update_and_delete_condition() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let collection = db
        .create_collection(store.id, OWNER, "Edit", CombinationMode::All)
        .await
        .unwrap();
    let stored = db
        .add_condition(
            collection.id,
            OWNER,
            Condition::new(FieldReference::Tag, FilterType::Equal, "sale"),
        )
        .await
        .unwrap();

    let updated = db
        .update_condition(
            stored.id,
            OWNER,
            Condition::new(FieldReference::Title, FilterType::StartsWith, "disney"),
        )
        .await
        .unwrap();
    assert_eq!(updated.collection_id, collection.id);
    let reloaded = db.get_condition(stored.id).await.unwrap().unwrap();
    assert_eq!(reloaded, updated);

    // An invalid update leaves the stored condition untouched
    assert!(db
        .update_condition(
            stored.id,
            OWNER,
            Condition::new(FieldReference::Title, FilterType::GreaterOrEqual, "a"),
        )
        .await
        .is_err());
    assert_eq!(db.get_condition(stored.id).await.unwrap().unwrap(), updated);

    db.delete_condition(stored.id, OWNER).await.unwrap();
    assert!(db.get_condition(stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_collection_cascades_conditions() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let collection = db
        .create_collection(store.id, OWNER, "Gone", CombinationMode::All)
        .await
        .unwrap();
    let stored = db
        .add_condition(
            collection.id,
            OWNER,
            Condition::new(FieldReference::Tag, FilterType::Equal, "sale"),
        )
        .await
        .unwrap();

    db.delete_collection(collection.id, OWNER).await.unwrap();
    assert!(db.get_collection(collection.id).await.unwrap().is_none());
    assert!(db.get_condition(stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_collection_products() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;

    let mut tagged = sample_product("Disney Print");
    tagged.tags = vec!["Disney".to_string()];
    let tagged = db.create_product(store.id, tagged).await.unwrap();
    db.create_product(store.id, sample_product("Plain"))
        .await
        .unwrap();

    let collection = db
        .create_collection(store.id, OWNER, "Disney", CombinationMode::All)
        .await
        .unwrap();

    // No conditions yet: the collection is empty
    assert!(db
        .get_collection_products(collection.id, 10)
        .await
        .unwrap()
        .is_empty());

    db.add_condition(
        collection.id,
        OWNER,
        Condition::new(FieldReference::Tag, FilterType::Equal, "disney"),
    )
    .await
    .unwrap();

    let products = db.get_collection_products(collection.id, 10).await.unwrap();
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![tagged.id]);

    assert!(db.get_collection_products(999, 10).await.is_err());
}
