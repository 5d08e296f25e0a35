//! Admin dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    db::{CustomerRepository, OrderRepository},
    error::Result,
    filters,
    middleware::RequireAdmin,
    models::{CustomerSummary, Order, OrderCounts},
    routes::Page,
    state::AppState,
};

/// How many of the newest orders the dashboard lists.
const RECENT_ORDERS: i64 = 5;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/dashboard.html")]
pub struct DashboardTemplate {
    pub page: Page,
    pub recent_orders: Vec<Order>,
    pub customers: Vec<CustomerSummary>,
    pub total_customers: usize,
    pub counts: OrderCounts,
}

/// Display the admin dashboard.
#[instrument(skip(state, session, admin), fields(user_id = %admin.id))]
pub async fn home(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());
    let recent_orders = orders.list_recent(RECENT_ORDERS).await?;
    let counts = orders.counts(None).await?;
    let customers = CustomerRepository::new(state.pool())
        .list_with_order_counts()
        .await?;

    Ok(DashboardTemplate {
        page: Page::load(&session, Some(admin)).await,
        total_customers: customers.len(),
        recent_orders,
        customers,
        counts,
    })
}
