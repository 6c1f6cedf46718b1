//! Admin-only routes and account moderation against a running storefront.

use bazaar_integration_tests::{
    add_to_cart, base_url, client, logged_in_admin, logged_in_user, login, pool, user_id,
};
use reqwest::{StatusCode, header};
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running storefront, database, and admin credentials"]
async fn test_admin_pages_reject_regular_users() {
    let resp = client()
        .get(format!("{}/admin/dashboard", base_url()))
        .send()
        .await
        .expect("Failed to get admin dashboard");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers().get(header::LOCATION).expect("Missing Location");
    assert!(location.to_str().unwrap_or_default().starts_with("/login"));

    let (user_client, _) = logged_in_user().await;
    let resp = user_client
        .get(format!("{}/admin/dashboard", base_url()))
        .send()
        .await
        .expect("Failed to get admin dashboard");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = user_client
        .get(format!("{}/admin/analytics/data", base_url()))
        .send()
        .await
        .expect("Failed to get analytics");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront, database, and admin credentials"]
async fn test_deactivation_is_idempotent_and_blocks_existing_tokens() {
    let admin = logged_in_admin().await;
    let (user_client, user) = logged_in_user().await;
    let id = user_id(&pool().await, &user.username).await;

    for _ in 0..2 {
        let resp = admin
            .post(format!("{}/admin/deactivate/{id}", base_url()))
            .send()
            .await
            .expect("Failed to deactivate");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).expect("Missing Location"),
            "/admin/users"
        );
    }

    // The token issued before deactivation no longer works
    let resp = user_client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = login(&client(), &user.username, &user.password).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let resp = admin
            .post(format!("{}/admin/activate/{id}", base_url()))
            .send()
            .await
            .expect("Failed to activate");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let resp = user_client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront, database, and admin credentials"]
async fn test_unknown_user_redirects_with_message() {
    let admin = logged_in_admin().await;

    let resp = admin
        .post(format!("{}/admin/deactivate/{}", base_url(), i64::MAX))
        .send()
        .await
        .expect("Failed to deactivate");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).expect("Missing Location"),
        "/admin/users?msg=User%20not%20found"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront, database, and admin credentials"]
async fn test_analytics_data_shape() {
    let admin = logged_in_admin().await;

    let report: Value = admin
        .get(format!("{}/admin/analytics/data", base_url()))
        .send()
        .await
        .expect("Failed to get analytics")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert!(report["daily_visits"].is_i64());
    assert!(report["monthly_visits"].as_i64() >= report["weekly_visits"].as_i64());
    assert_eq!(report["sales_trend"].as_array().map(Vec::len), Some(7));
    assert!(report["most_viewed_products"].as_array().is_some_and(|p| p.len() <= 5));
}

#[tokio::test]
#[ignore = "Requires running storefront, database, and admin credentials"]
async fn test_final_order_status_cannot_change() {
    let admin = logged_in_admin().await;
    let (user_client, user) = logged_in_user().await;
    let pool = pool().await;
    let id = user_id(&pool, &user.username).await;

    add_to_cart(&user_client, 5, "Foundation", "24.00").await;
    let resp = user_client
        .post(format!("{}/cod-checkout", base_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let order_id: i64 = sqlx::query_scalar("SELECT id FROM orders WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("Order row missing");
    let status_url = format!("{}/admin/orders/{order_id}/status", base_url());

    let resp = admin
        .post(&status_url)
        .form(&[("status", "delivered")])
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(
        resp.headers().get(header::LOCATION).expect("Missing Location"),
        "/admin/dashboard"
    );

    let resp = admin
        .post(&status_url)
        .form(&[("status", "placed")])
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).expect("Missing Location"),
        "/admin/dashboard?msg=Order%20is%20already%20final"
    );

    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .expect("Order row missing");
    assert_eq!(status, "delivered");
}
