//! Integration tests for Storekeep.
//!
//! The tests drive a running server over HTTP and use the database directly
//! for setup that has no web form (admin accounts, products).
//!
//! # Running Tests
//!
//! ```bash
//! sk-cli migrate
//! cargo run -p storekeep-web &
//! cargo test -p storekeep-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREKEEP_TEST_URL` - Server under test (default `http://localhost:8000`)
//! - `STOREKEEP_DATABASE_URL` - The database that server uses

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response, redirect::Policy};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use storekeep_core::{Price, ProductCategory, ProductId};
use storekeep_web::db::{self, CustomerRepository, ProductRepository};
use storekeep_web::services::AuthService;

/// A password every validator accepts.
pub const TEST_PASSWORD: &str = "tangerine-Orbit-42";

/// Shared handles for one test.
pub struct TestContext {
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the database behind the server under test.
    pub async fn new() -> Self {
        let base_url = std::env::var("STOREKEEP_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let database_url = std::env::var("STOREKEEP_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .expect("STOREKEEP_DATABASE_URL must be set");
        let pool = db::create_pool(&database_url)
            .await
            .expect("Failed to connect to database");

        Self { base_url, pool }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Create an admin account and return its username.
    pub async fn create_admin(&self) -> String {
        let username = unique_name("admin");
        AuthService::new(&self.pool)
            .create_admin(&username, None, TEST_PASSWORD)
            .await
            .expect("Failed to create admin");
        username
    }

    /// Create a product nobody else's test will touch.
    pub async fn create_product(&self) -> (ProductId, String) {
        let name = unique_name("product");
        let id = ProductRepository::new(&self.pool)
            .create(&name, Price::from_cents(1_050), ProductCategory::Indoor, None, &[])
            .await
            .expect("Failed to create product");
        (id, name)
    }

    /// Delete a customer (and its orders) left behind by a test.
    pub async fn cleanup_customer(&self, name: &str) {
        let customers = CustomerRepository::new(&self.pool)
            .list_all()
            .await
            .expect("Failed to list customers");
        for customer in customers.into_iter().filter(|c| c.name == name) {
            let _ = CustomerRepository::new(&self.pool).delete(customer.id).await;
        }
    }

    pub async fn cleanup_product(&self, id: ProductId) {
        let _ = ProductRepository::new(&self.pool).delete(id).await;
    }
}

/// A name with a random suffix so parallel tests do not collide.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    format!("{prefix}_{suffix}")
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Log `client` in and return where the server sent it.
pub async fn login(ctx: &TestContext, client: &Client, username: &str, password: &str) -> Response {
    client
        .post(ctx.url("/login/"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("Login request failed")
}

/// Register a customer account through the public form.
pub async fn register(ctx: &TestContext, client: &Client, username: &str, email: &str) -> Response {
    client
        .post(ctx.url("/register/"))
        .form(&[
            ("username", username),
            ("email", email),
            ("password1", TEST_PASSWORD),
            ("password2", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("Register request failed")
}
