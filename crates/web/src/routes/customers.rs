//! Customer detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use storekeep_core::CustomerId;

use crate::{
    db::{CustomerRepository, OrderRepository, ProductRepository},
    error::{AppError, Result},
    filters,
    forms::{FormErrors, SelectOption},
    middleware::RequireAdmin,
    models::{Customer, Order},
    order_filter::OrderFilterParams,
    routes::{Page, parse_path_id},
    state::AppState,
};

/// Customer detail template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/customer.html")]
pub struct CustomerTemplate {
    pub page: Page,
    pub customer: Customer,
    /// Every order of the customer, before filtering.
    pub order_count: usize,
    pub orders: Vec<Order>,
    pub params: OrderFilterParams,
    pub product_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub filter_errors: FormErrors,
    pub filtered: bool,
}

/// Display one customer's profile and orders, narrowed by the filter form.
#[instrument(skip(state, session, admin, params))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Query(params): Query<OrderFilterParams>,
) -> Result<impl IntoResponse> {
    let id: CustomerId = parse_path_id(&id, "customer")?;
    let customer = CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    let orders = OrderRepository::new(state.pool())
        .list_for_customer(id)
        .await?;
    let products = ProductRepository::new(state.pool()).list_choices().await?;

    let order_count = orders.len();
    let (filter, filter_errors) = params.parse(&products);
    let orders = filter.apply(orders);

    Ok(CustomerTemplate {
        page: Page::load(&session, Some(admin)).await,
        product_options: params.product_options(&products),
        status_options: params.status_options(),
        filtered: filter.is_active(),
        customer,
        order_count,
        orders,
        params,
        filter_errors,
    })
}
