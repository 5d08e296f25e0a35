//! Product and tag management commands.
//!
//! # Usage
//!
//! ```bash
//! sk-cli tag create Sports
//! sk-cli product create -n "Ball" --price 9.99 -c out_door -t Sports
//! sk-cli product delete 3
//! ```

use storekeep_core::{ParseEnumError, Price, PriceError, ProductCategory, ProductId, TagId};
use storekeep_web::db::{ProductRepository, RepositoryError};

use super::{CliError, connect};

const NAME_MAX_LEN: usize = 200;

fn check_name(field: &'static str, name: &str) -> Result<(), CliError> {
    if name.trim().is_empty() || name.chars().count() > NAME_MAX_LEN {
        return Err(CliError::invalid(field, "must be 1 to 200 characters"));
    }
    Ok(())
}

/// Create a tag, or look up the existing one with that name.
///
/// # Errors
///
/// Returns an error if the name is invalid or the database is unreachable.
pub async fn create_tag(name: &str) -> Result<TagId, CliError> {
    check_name("tag", name)?;

    let pool = connect().await?;
    let id = ProductRepository::new(&pool).ensure_tag(name.trim()).await?;

    tracing::info!("Tag ready! ID: {}, Name: {}", id, name.trim());
    Ok(id)
}

/// Create a product and attach existing tags.
///
/// # Errors
///
/// Returns an error if an argument is invalid, a tag does not exist or the
/// database is unreachable.
pub async fn create_product(
    name: &str,
    price: &str,
    category: &str,
    description: Option<&str>,
    tags: &[String],
) -> Result<ProductId, CliError> {
    check_name("name", name)?;
    let price: Price = price
        .parse()
        .map_err(|e: PriceError| CliError::invalid("price", e.to_string()))?;
    let category: ProductCategory = category
        .parse()
        .map_err(|e: ParseEnumError| CliError::invalid("category", e.to_string()))?;

    let pool = connect().await?;
    let id = ProductRepository::new(&pool)
        .create(name.trim(), price, category, description, tags)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                CliError::invalid("tag", "every tag must exist; create it with `sk-cli tag create`")
            }
            other => other.into(),
        })?;

    tracing::info!("Product created! ID: {}, Name: {}, Price: {}", id, name.trim(), price);
    Ok(id)
}

/// Delete a product that no order references.
///
/// # Errors
///
/// Returns an error if orders still reference the product, it does not
/// exist, or the database is unreachable.
pub async fn delete_product(id: ProductId) -> Result<(), CliError> {
    let pool = connect().await?;
    ProductRepository::new(&pool).delete(id).await?;

    tracing::info!("Product {} deleted", id);
    Ok(())
}
