//! Customer dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;

use crate::{
    db::OrderRepository,
    error::Result,
    filters,
    middleware::RequireCustomer,
    models::{Order, OrderCounts},
    routes::Page,
    state::AppState,
};

/// Customer dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/user.html")]
pub struct UserTemplate {
    pub page: Page,
    pub orders: Vec<Order>,
    pub counts: OrderCounts,
}

/// Display the signed-in customer's own orders.
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(user, customer_id): RequireCustomer,
    session: Session,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer_id)
        .await?;

    Ok(UserTemplate {
        page: Page::load(&session, Some(user)).await,
        counts: OrderCounts::tally(&orders),
        orders,
    })
}
