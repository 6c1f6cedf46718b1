//! Cart, wishlist, and COD checkout against a running storefront.

use bazaar_integration_tests::{add_to_cart, base_url, logged_in_user, pool, user_id};
use reqwest::{StatusCode, header};
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_adding_same_product_twice_keeps_one_row() {
    let (client, _) = logged_in_user().await;

    let first: Value = add_to_cart(&client, 7, "Lipstick", "12.50")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(first["message"], "Added to cart!");

    let second: Value = add_to_cart(&client, 7, "Lipstick", "12.50")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(second["message"], "Already in cart");

    let items: Vec<Value> = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().map(|i| i["product_id"].clone()), Some(Value::from(7)));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_add_without_snapshot_is_bad_request() {
    let (client, _) = logged_in_user().await;

    let resp = client
        .post(format!("{}/add-to-cart/7", base_url()))
        .query(&[("title", "Lipstick")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_moves_whole_cart_into_one_order() {
    let (client, user) = logged_in_user().await;
    let pool = pool().await;
    let id = user_id(&pool, &user.username).await;

    add_to_cart(&client, 1, "Mascara", "9.99").await;
    add_to_cart(&client, 2, "Eyeshadow Palette", "19.01").await;

    let resp = client
        .post(format!("{}/cod-checkout", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).expect("Missing Location"),
        "/orders"
    );

    let cart_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("Failed to count cart");
    assert_eq!(cart_rows, 0);

    let (orders, items, total): (i64, i64, String) = sqlx::query_as(
        "SELECT COUNT(DISTINCT o.id), COUNT(oi.id), COALESCE(SUM(oi.price), 0)::TEXT
         FROM orders o JOIN order_items oi ON oi.order_id = o.id
         WHERE o.user_id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .expect("Failed to read orders");
    assert_eq!(orders, 1);
    assert_eq!(items, 2);
    assert_eq!(total, "29.00");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_with_empty_cart_creates_nothing() {
    let (client, user) = logged_in_user().await;
    let pool = pool().await;
    let id = user_id(&pool, &user.username).await;

    let resp = client
        .post(format!("{}/cod-checkout", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).expect("Missing Location"),
        "/cart?msg=Your%20cart%20is%20empty"
    );

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("Failed to count orders");
    assert_eq!(orders, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wishlist_add_and_remove() {
    let (client, _) = logged_in_user().await;

    let resp: Value = client
        .post(format!("{}/add-to-wishlist/3", base_url()))
        .query(&[
            ("title", "Blush"),
            ("price", "5.00"),
            ("image", "https://cdn.example.com/3.png"),
        ])
        .send()
        .await
        .expect("Failed to add to wishlist")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(resp["message"], "Added to wishlist!");

    let items: Vec<Value> = client
        .get(format!("{}/api/wishlist", base_url()))
        .send()
        .await
        .expect("Failed to get wishlist")
        .json()
        .await
        .expect("Failed to parse JSON");
    let item_id = items
        .first()
        .and_then(|i| i["id"].as_i64())
        .expect("Wishlist item missing");

    let resp = client
        .post(format!("{}/wishlist/remove/{item_id}", base_url()))
        .send()
        .await
        .expect("Failed to remove");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/wishlist/remove/{item_id}", base_url()))
        .send()
        .await
        .expect("Failed to remove");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_anonymous_click_is_tracked() {
    let resp = bazaar_integration_tests::client()
        .post(format!("{}/track-click", base_url()))
        .json(&serde_json::json!({ "product_id": 11 }))
        .send()
        .await
        .expect("Failed to track click");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = bazaar_integration_tests::client()
        .post(format!("{}/track-click", base_url()))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("Failed to track click");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_top_clicked_lists_product_ids_by_click_count() {
    let (client, _) = logged_in_user().await;

    for product_id in [4, 8, 8, 8, 4] {
        let resp = client
            .post(format!("{}/track-click", base_url()))
            .json(&serde_json::json!({ "product_id": product_id }))
            .send()
            .await
            .expect("Failed to track click");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let top: Value = client
        .get(format!("{}/top-clicked", base_url()))
        .send()
        .await
        .expect("Failed to get top clicked")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(top, serde_json::json!([8, 4]));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_failed_checkout_rolls_back_order_and_keeps_cart() {
    let (client, user) = logged_in_user().await;
    let pool = pool().await;
    let id = user_id(&pool, &user.username).await;

    // Fails the order_items insert, after the order row already exists
    sqlx::query(
        r"
        CREATE OR REPLACE FUNCTION it_reject_trap_item() RETURNS trigger AS $$
        BEGIN
            IF NEW.title = 'Rollback Trap' THEN
                RAISE EXCEPTION 'rejected trap item';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        ",
    )
    .execute(&pool)
    .await
    .expect("Failed to create trigger function");
    sqlx::query("DROP TRIGGER IF EXISTS it_reject_trap_item ON order_items")
        .execute(&pool)
        .await
        .expect("Failed to drop trigger");
    sqlx::query(
        "CREATE TRIGGER it_reject_trap_item BEFORE INSERT ON order_items
         FOR EACH ROW EXECUTE FUNCTION it_reject_trap_item()",
    )
    .execute(&pool)
    .await
    .expect("Failed to create trigger");

    add_to_cart(&client, 21, "Primer", "8.00").await;
    add_to_cart(&client, 22, "Rollback Trap", "1.00").await;

    let resp = client
        .post(format!("{}/cod-checkout", base_url()))
        .send()
        .await
        .expect("Failed to check out");

    sqlx::query("DROP TRIGGER IF EXISTS it_reject_trap_item ON order_items")
        .execute(&pool)
        .await
        .expect("Failed to drop trigger");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("Failed to count orders");
    assert_eq!(orders, 0);

    let cart_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("Failed to count cart");
    assert_eq!(cart_rows, 2);
}
