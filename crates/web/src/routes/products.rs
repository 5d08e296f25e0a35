//! Product catalog route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;

use crate::{
    db::ProductRepository,
    error::Result,
    filters,
    middleware::RequireAdmin,
    models::Product,
    routes::Page,
    state::AppState,
};

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/products.html")]
pub struct ProductsTemplate {
    pub page: Page,
    pub products: Vec<Product>,
}

/// Display every product with its category, price and tags.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    Ok(ProductsTemplate {
        page: Page::load(&session, Some(admin)).await,
        products,
    })
}
