//! Customer management commands.
//!
//! # Usage
//!
//! ```bash
//! sk-cli customer create -n "Peter Piper" -p 555-0100 -e peter@example.com
//! sk-cli customer delete 7
//! ```

use storekeep_core::{CustomerId, Email};
use storekeep_web::db::CustomerRepository;

use super::{CliError, connect};

const FIELD_MAX_LEN: usize = 200;

/// Create a customer with no login.
///
/// # Errors
///
/// Returns an error if an argument is invalid or the database is unreachable.
pub async fn create(name: &str, phone: Option<&str>, email: Option<&str>) -> Result<CustomerId, CliError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > FIELD_MAX_LEN {
        return Err(CliError::invalid("name", "must be 1 to 200 characters"));
    }
    if let Some(email) = email {
        Email::parse(email).map_err(|e| CliError::invalid("email", e.to_string()))?;
    }

    let pool = connect().await?;
    let customer = CustomerRepository::new(&pool).create(name, phone, email).await?;

    tracing::info!("Customer created! ID: {}, Name: {}", customer.id, customer.name);
    Ok(customer.id)
}

/// Delete a customer and, through the foreign key cascade, their orders.
///
/// # Errors
///
/// Returns an error if the customer does not exist or the database is
/// unreachable.
pub async fn delete(id: CustomerId) -> Result<(), CliError> {
    let pool = connect().await?;
    CustomerRepository::new(&pool).delete(id).await?;

    tracing::info!("Customer {} deleted along with their orders", id);
    Ok(())
}
