//! End-to-end tests for the Bazaar storefront.
//!
//! The tests drive a running storefront over HTTP and inspect its database
//! directly. They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server
//! cargo run -p bazaar-cli -- migrate
//! cargo run -p bazaar-storefront
//!
//! # Run integration tests
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Server under test (default `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD` - Built-in administrator credentials

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, StatusCode, redirect};
use sqlx::PgPool;

/// Base URL for the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A cookie-keeping client that does not follow redirects, so tests can
/// assert on 303 targets.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the storefront database.
pub async fn pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// A throwaway account.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    /// Fresh credentials that will not collide with earlier runs.
    #[must_use]
    pub fn unique() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let short = suffix.get(..12).unwrap_or(&suffix);
        Self {
            username: format!("it_{short}"),
            email: format!("it_{short}@example.com"),
            password: "integration-pass".to_string(),
        }
    }
}

/// POST the registration form.
pub async fn register(client: &Client, user: &TestUser) -> reqwest::Response {
    client
        .post(format!("{}/register", base_url()))
        .form(&[
            ("username", user.username.as_str()),
            ("email", user.email.as_str()),
            ("password", user.password.as_str()),
        ])
        .send()
        .await
        .expect("Failed to register")
}

/// POST the login form. On success the client holds the access token cookie.
pub async fn login(client: &Client, username: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{}/login", base_url()))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("Failed to log in")
}

/// Register a fresh account and log in as it.
pub async fn logged_in_user() -> (Client, TestUser) {
    let client = client();
    let user = TestUser::unique();

    let resp = register(&client, &user).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "registration failed");

    let resp = login(&client, &user.username, &user.password).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login failed");

    (client, user)
}

/// Log in as the built-in administrator.
pub async fn logged_in_admin() -> Client {
    let username = std::env::var("ADMIN_USERNAME").expect("ADMIN_USERNAME must be set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set");

    let client = client();
    let resp = login(&client, &username, &password).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "admin login failed");
    client
}

/// POST `/add-to-cart/{product_id}` with a product snapshot.
pub async fn add_to_cart(
    client: &Client,
    product_id: i64,
    title: &str,
    price: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/add-to-cart/{product_id}", base_url()))
        .query(&[
            ("title", title),
            ("price", price),
            ("image", "https://cdn.example.com/p.png"),
        ])
        .send()
        .await
        .expect("Failed to add to cart")
}

/// Look up an account id by username.
pub async fn user_id(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("User row missing")
}
