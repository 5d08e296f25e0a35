//! Order management route handlers (admin).
//!
//! Orders are created in batches through a formset, edited one at a time,
//! and deleted after a confirmation page. Every successful write redirects
//! to the dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use storekeep_core::{CustomerId, OrderId};

use crate::{
    db::{CustomerRepository, OrderRepository, ProductRepository, RepositoryError},
    error::{AppError, Result, add_breadcrumb},
    filters,
    forms::{
        FormErrors, SelectOption,
        order::{FORMSET_PREFIX, FormsetErrors, FormsetRowView, MAX_FORMS, OrderForm, OrderFormset},
    },
    middleware::{FlashLevel, RequireAdmin, push_flash},
    models::{Customer, CurrentUser, Order, ProductChoice},
    routes::{Page, parse_path_id},
    state::AppState,
};

const HOME_PATH: &str = "/";

// =============================================================================
// Templates
// =============================================================================

/// Order formset template (create).
#[derive(Template, WebTemplate)]
#[template(path = "orders/order_formset.html")]
pub struct OrderFormsetTemplate {
    pub page: Page,
    pub customer: Customer,
    pub prefix: &'static str,
    pub total_forms: usize,
    pub max_forms: usize,
    pub rows: Vec<FormsetRowView>,
    pub non_form_errors: Vec<String>,
}

impl OrderFormsetTemplate {
    async fn build(
        session: &Session,
        admin: CurrentUser,
        customer: Customer,
        formset: &OrderFormset,
        products: &[ProductChoice],
        errors: Option<&FormsetErrors>,
    ) -> Self {
        Self {
            page: Page::load(session, Some(admin)).await,
            customer,
            prefix: FORMSET_PREFIX,
            total_forms: formset.total_forms(),
            max_forms: MAX_FORMS,
            rows: formset.rows(products, errors),
            non_form_errors: errors.map(|e| e.non_form.clone()).unwrap_or_default(),
        }
    }
}

/// Order edit template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/order_form.html")]
pub struct OrderFormTemplate {
    pub page: Page,
    pub order: Order,
    pub form: OrderForm,
    pub customer_options: Vec<SelectOption>,
    pub product_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

impl OrderFormTemplate {
    async fn build(
        session: &Session,
        admin: CurrentUser,
        order: Order,
        form: OrderForm,
        customers: &[Customer],
        products: &[ProductChoice],
        errors: FormErrors,
    ) -> Self {
        Self {
            page: Page::load(session, Some(admin)).await,
            customer_options: form.customer_options(customers),
            product_options: form.product_options(products),
            status_options: form.status_options(),
            order,
            form,
            errors,
        }
    }
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/delete.html")]
pub struct DeleteOrderTemplate {
    pub page: Page,
    pub order: Order,
}

// =============================================================================
// Lookups
// =============================================================================

async fn find_customer(state: &AppState, raw_id: &str) -> Result<Customer> {
    let id: CustomerId = parse_path_id(raw_id, "customer")?;
    CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))
}

async fn find_order(state: &AppState, raw_id: &str) -> Result<Order> {
    let id: OrderId = parse_path_id(raw_id, "order")?;
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

// =============================================================================
// Create
// =============================================================================

/// Display a blank order formset for a customer.
pub async fn create_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse> {
    let customer = find_customer(&state, &customer_id).await?;
    let products = ProductRepository::new(state.pool()).list_choices().await?;

    Ok(OrderFormsetTemplate::build(
        &session,
        admin,
        customer,
        &OrderFormset::blank(),
        &products,
        None,
    )
    .await)
}

/// Handle the order formset submission.
///
/// Either every non-blank row is saved or none is.
#[instrument(skip(state, session, admin, fields))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(customer_id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let customer = find_customer(&state, &customer_id).await?;
    let products = ProductRepository::new(state.pool()).list_choices().await?;
    let formset = OrderFormset::from_pairs(&fields);

    let mut errors = match formset.validate(&products) {
        Ok(lines) => {
            match OrderRepository::new(state.pool())
                .create_many(customer.id, &lines)
                .await
            {
                Ok(ids) => {
                    tracing::info!(customer_id = %customer.id, count = ids.len(), "Orders created");
                    add_breadcrumb("orders", "Orders created", None);
                    if !ids.is_empty() {
                        push_flash(
                            &session,
                            FlashLevel::Success,
                            format!("Created {} order(s) for {}.", ids.len(), customer.name),
                        )
                        .await;
                    }
                    return Ok(Redirect::to(HOME_PATH).into_response());
                }
                Err(RepositoryError::Conflict(reason)) => {
                    tracing::warn!(customer_id = %customer.id, reason = %reason, "Order batch rejected");
                    FormsetErrors::default()
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    if errors.non_form.is_empty() && errors.rows.iter().all(FormErrors::is_empty) {
        errors
            .non_form
            .push("A product was removed while you were editing. Please try again.".to_owned());
    }

    Ok(
        OrderFormsetTemplate::build(&session, admin, customer, &formset, &products, Some(&errors))
            .await
            .into_response(),
    )
}

// =============================================================================
// Update
// =============================================================================

/// Display the edit form for an order.
pub async fn update_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = find_order(&state, &id).await?;
    let customers = CustomerRepository::new(state.pool()).list_all().await?;
    let products = ProductRepository::new(state.pool()).list_choices().await?;
    let form = OrderForm::from_order(&order);

    Ok(OrderFormTemplate::build(
        &session,
        admin,
        order,
        form,
        &customers,
        &products,
        FormErrors::new(),
    )
    .await)
}

/// Handle the order edit form submission.
#[instrument(skip(state, session, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderForm>,
) -> Result<Response> {
    let order = find_order(&state, &id).await?;
    let customers = CustomerRepository::new(state.pool()).list_all().await?;
    let products = ProductRepository::new(state.pool()).list_choices().await?;

    let errors = match form.validate(&customers, &products) {
        Ok(input) => match OrderRepository::new(state.pool()).update(order.id, &input).await {
            Ok(()) => {
                tracing::info!(order_id = %order.id, "Order updated");
                push_flash(&session, FlashLevel::Success, format!("Order #{} updated.", order.id)).await;
                return Ok(Redirect::to(HOME_PATH).into_response());
            }
            Err(RepositoryError::Conflict(reason)) => {
                tracing::warn!(order_id = %order.id, reason = %reason, "Order update rejected");
                let mut errors = FormErrors::new();
                errors.add_non_field("The customer or product was removed. Please try again.");
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    Ok(
        OrderFormTemplate::build(&session, admin, order, form, &customers, &products, errors)
            .await
            .into_response(),
    )
}

// =============================================================================
// Delete
// =============================================================================

/// Ask for confirmation before deleting an order.
pub async fn delete_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = find_order(&state, &id).await?;

    Ok(DeleteOrderTemplate {
        page: Page::load(&session, Some(admin)).await,
        order,
    })
}

/// Delete an order. There is no undo.
#[instrument(skip(state, session, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let id: OrderId = parse_path_id(&id, "order")?;
    OrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, "Order deleted");
    push_flash(&session, FlashLevel::Info, format!("Order #{id} deleted.")).await;
    Ok(Redirect::to(HOME_PATH).into_response())
}
