//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! STOREKEEP_ADMIN_PASSWORD='...' sk-cli admin create -u boss -e boss@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOREKEEP_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREKEEP_ADMIN_PASSWORD` - Password for the new account (or `--password`)

use storekeep_core::{Email, UserId};
use storekeep_web::forms::password::password_problems;
use storekeep_web::forms::registration::{USERNAME_MAX_LEN, is_valid_username};
use storekeep_web::services::AuthService;

use super::{CliError, connect};

/// Check the arguments before touching the database.
fn validate(username: &str, email: Option<&str>, password: &str) -> Result<Option<Email>, CliError> {
    if !is_valid_username(username) || username.chars().count() > USERNAME_MAX_LEN {
        return Err(CliError::invalid(
            "username",
            "use at most 150 letters, digits and @/./+/-/_",
        ));
    }

    let email = email
        .map(Email::parse)
        .transpose()
        .map_err(|e| CliError::invalid("email", e.to_string()))?;

    let identity = [username, email.as_ref().map_or("", Email::as_str)];
    let problems = password_problems(password, &identity);
    if !problems.is_empty() {
        return Err(CliError::invalid("password", problems.join(" ")));
    }

    Ok(email)
}

/// Create a new admin user.
///
/// # Errors
///
/// Returns an error if an argument is invalid, the username is taken or
/// the database is unreachable.
pub async fn create_user(
    username: &str,
    email: Option<&str>,
    password: &str,
) -> Result<UserId, CliError> {
    let email = validate(username, email, password)?;
    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", username);
    let user = AuthService::new(&pool)
        .create_admin(username, email.as_ref(), password)
        .await?;

    tracing::info!("Admin user created successfully! ID: {}, Username: {}", user.id, user.username);
    Ok(user.id)
}
