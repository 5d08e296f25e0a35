//! Authentication service.
//!
//! Username/password sign-in, customer registration and password resets.
//! Passwords are stored as Argon2id PHC strings.

mod error;
pub mod reset;

pub use error::AuthError;
pub use reset::{IssuedReset, PasswordResetService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use storekeep_core::Role;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::forms::registration::ValidRegistration;
use crate::models::{CurrentUser, Customer, User};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a customer account and its linked customer profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn register_customer(
        &self,
        registration: &ValidRegistration,
    ) -> Result<(User, Customer), AuthError> {
        let password_hash = hash_password(&registration.password)?;

        self.users
            .create_customer_account(
                &registration.username,
                registration.email.as_ref(),
                &password_hash,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a username and password, returning the session identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// the password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let credentials = self
            .users
            .get_credentials(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        Ok(CurrentUser {
            id: credentials.user.id,
            username: credentials.user.username,
            role: credentials.user.role,
            customer_id: credentials.customer_id,
        })
    }

    /// Whether a username is already registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn username_taken(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.users.username_exists(username).await?)
    }

    /// Create an administrator account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn create_admin(
        &self,
        username: &str,
        email: Option<&storekeep_core::Email>,
        password: &str,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;
        self.users
            .create(username, email, &password_hash, Role::Admin)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match.
/// Returns `AuthError::PasswordHash` if the hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
