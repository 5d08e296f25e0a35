//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET       /                              Admin dashboard
//! GET       /products/                     Product list (admin)
//! GET       /customer/{id}/                Customer orders with filter (admin)
//!
//! # Customer pages
//! GET       /user/                         Customer dashboard
//! GET|POST  /account/                      Account settings (multipart)
//!
//! # Orders (admin)
//! GET|POST  /create_order/{customer_id}    Order formset
//! GET|POST  /update_order/{id}/            Order form
//! GET|POST  /delete_order/{id}/            Delete confirmation
//!
//! # Auth
//! GET|POST  /register/                     Registration (rate limited)
//! GET|POST  /login/                        Login (rate limited)
//! POST      /logout/                       Logout
//!
//! # Password reset
//! GET|POST  /reset_password/               Request a link (rate limited)
//! GET       /reset_password_sent/          Link sent
//! GET|POST  /reset/{uidb64}/{token}/       Set a new password
//! GET       /reset_password_complete/      Done
//!
//! # Operations
//! GET       /health                        Liveness
//! GET       /health/ready                  Readiness (database ping)
//! ```

pub mod account;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod password_reset;
pub mod products;
pub mod user;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::forms::customer::MAX_UPLOAD_BYTES;
use crate::middleware::{FlashMessage, auth_rate_limiter, take_flashes};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Multipart overhead allowed on top of the picture itself.
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

/// What every page shows besides its own content: the navigation bar and
/// pending flash messages.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

impl Page {
    /// Build the page chrome, consuming pending flash messages.
    pub async fn load(session: &Session, user: Option<CurrentUser>) -> Self {
        Self {
            user,
            flashes: take_flashes(session).await,
        }
    }
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: the database must answer.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

/// Create the auth routes. Form submissions are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register/",
            post(auth::register)
                .layer(auth_rate_limiter())
                .get(auth::register_page),
        )
        .route(
            "/login/",
            post(auth::login)
                .layer(auth_rate_limiter())
                .get(auth::login_page),
        )
        .route("/logout/", post(auth::logout))
        .route(
            "/reset_password/",
            post(password_reset::request)
                .layer(auth_rate_limiter())
                .get(password_reset::request_page),
        )
        .route("/reset_password_sent/", get(password_reset::sent))
        .route(
            "/reset/{uidb64}/{token}/",
            get(password_reset::confirm_page).post(password_reset::confirm),
        )
        .route("/reset_password_complete/", get(password_reset::complete))
}

/// Create the order routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create_order/{customer_id}",
            get(orders::create_page).post(orders::create),
        )
        .route(
            "/update_order/{id}/",
            get(orders::update_page).post(orders::update),
        )
        .route(
            "/delete_order/{id}/",
            get(orders::delete_page).post(orders::delete),
        )
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::home))
        .route("/products/", get(products::index))
        .route("/customer/{id}/", get(customers::show))
        .route("/user/", get(user::index))
        .route(
            "/account/",
            get(account::settings_page)
                .post(account::save_settings)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_SLACK_BYTES)),
        )
        .merge(order_routes())
        .merge(auth_routes())
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Parse an id from a path segment, answering 404 when it is not one.
pub(crate) fn parse_path_id<T: std::str::FromStr>(raw: &str, what: &str) -> crate::error::Result<T> {
    raw.parse()
        .map_err(|_| crate::error::AppError::NotFound(format!("{what} {raw}")))
}
