use crate::database::test_helpers::{sample_product, sample_store, setup_test_db, OWNER};
use crate::database::Database;
use storefront_common::{CartError, OrderStatus, OrderStatusError};

const BUYER: &str = "buyer@example.com";

/// Store with one 5.00 product and a cart holding two of it
async fn cart_with_items(db: &Database) -> (i64, String) {
    let store = sample_store(db, "Fabric").await;
    let product = db
        .create_product(store.id, sample_product("Cotton"))
        .await
        .unwrap();
    let cart = db
        .create_cart(&store.slug, Some(BUYER), 0, 10)
        .await
        .unwrap();
    db.add_to_cart(&cart.id, product.id, 2, "").await.unwrap();
    (store.id, cart.id)
}

#[tokio::test]
async fn test_create_order_from_cart() {
    let db = setup_test_db().await;
    let (store_id, cart_id) = cart_with_items(&db).await;

    let order = db.create_order_from_cart(&cart_id, BUYER).await.unwrap();
    assert_eq!(order.store_id, store_id);
    assert_eq!(order.user_id, BUYER);
    assert_eq!(order.cart_id.as_deref(), Some(cart_id.as_str()));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.currency, "CAD");
    assert_eq!(order.amount_cents, 1000);
    assert_eq!(order.discount_cents, 0);
    assert_eq!(order.final_amount_cents, 1000);
    assert!(order.finished_at_ns.is_none());
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].title, "Cotton");
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].total_cents, 1000);

    let cart = db.get_cart(&cart_id).await.unwrap().unwrap();
    assert!(!cart.is_active);

    let history = db.get_order_history(order.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Pending);
    assert_eq!(history[0].actor_id, BUYER);

    // The cart was consumed
    let err = db.create_order_from_cart(&cart_id, BUYER).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CartError>(),
        Some(CartError::Inactive(_))
    ));
}

#[tokio::test]
async fn test_empty_cart_cannot_be_ordered() {
    let db = setup_test_db().await;
    let store = sample_store(&db, "Fabric").await;
    let cart = db.create_cart(&store.slug, None, 0, 10).await.unwrap();

    let err = db.create_order_from_cart(&cart.id, BUYER).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<CartError>(),
        Some(&CartError::Empty(cart.id.clone()))
    );
    assert!(db.get_cart(&cart.id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_cart_of_another_user_cannot_be_ordered() {
    let db = setup_test_db().await;
    let (_, cart_id) = cart_with_items(&db).await;

    let err = db
        .create_order_from_cart(&cart_id, "someone-else")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unauthorized"));
}

#[tokio::test]
async fn test_order_status_lifecycle() {
    let db = setup_test_db().await;
    let (_, cart_id) = cart_with_items(&db).await;
    let order = db.create_order_from_cart(&cart_id, BUYER).await.unwrap();

    for status in [
        OrderStatus::Processing,
        OrderStatus::Packaged,
        OrderStatus::Shipped,
        OrderStatus::Received,
    ] {
        let updated = db
            .update_order_status(order.id, OWNER, status, "")
            .await
            .unwrap();
        assert_eq!(updated.status, status);
        assert!(updated.finished_at_ns.is_none());
    }

    let closed = db
        .update_order_status(order.id, OWNER, OrderStatus::Closed, "delivered")
        .await
        .unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);
    assert!(closed.finished_at_ns.is_some());

    let history = db.get_order_history(order.id).await.unwrap();
    let statuses: Vec<OrderStatus> = history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Packaged,
            OrderStatus::Shipped,
            OrderStatus::Received,
            OrderStatus::Closed,
        ]
    );
    assert_eq!(history.last().unwrap().notes, "delivered");
}

#[tokio::test]
async fn test_illegal_transition_is_rejected() {
    let db = setup_test_db().await;
    let (_, cart_id) = cart_with_items(&db).await;
    let order = db.create_order_from_cart(&cart_id, BUYER).await.unwrap();

    let err = db
        .update_order_status(order.id, OWNER, OrderStatus::Shipped, "")
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<OrderStatusError>(),
        Some(&OrderStatusError {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
        })
    );

    let reloaded = db.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, OrderStatus::Pending);
    assert_eq!(db.get_order_history(order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_orders() {
    let db = setup_test_db().await;
    let (store_id, first_cart) = cart_with_items(&db).await;
    let first = db.create_order_from_cart(&first_cart, BUYER).await.unwrap();

    let store = db.get_store(store_id).await.unwrap().unwrap();
    let product_id = first.items[0].product_id.unwrap();
    let second_cart = db
        .create_cart(&store.slug, Some(BUYER), 0, 10)
        .await
        .unwrap();
    db.add_to_cart(&second_cart.id, product_id, 1, "")
        .await
        .unwrap();
    let second = db
        .create_order_from_cart(&second_cart.id, BUYER)
        .await
        .unwrap();

    let ids: Vec<i64> = db
        .list_user_orders(BUYER)
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let ids: Vec<i64> = db
        .list_store_orders(store_id, OWNER)
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert!(db.list_store_orders(store_id, BUYER).await.is_err());
    assert!(db.list_user_orders("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_orders_survive_cart_deletion() {
    let db = setup_test_db().await;
    let (_, cart_id) = cart_with_items(&db).await;
    let order = db.create_order_from_cart(&cart_id, BUYER).await.unwrap();

    assert_eq!(db.delete_inactive_carts().await.unwrap(), 1);

    let reloaded = db.get_order(order.id).await.unwrap().unwrap();
    assert!(reloaded.cart_id.is_none());
    assert_eq!(reloaded.items, order.items);
}
