//! User repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! internal row types.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storekeep_core::{CustomerId, Email, Role, UserId};

use super::RepositoryError;
use super::customers::CustomerRow;
use crate::models::{Customer, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// User row joined with its password hash and customer link, for login.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
    customer_id: Option<i32>,
}

/// A user with the secrets needed to authenticate them.
#[derive(Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub customer_id: Option<CustomerId>,
}

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.role, u.created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user, their password hash and their customer link by username,
    /// compared case-insensitively like the unique index.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r"
            SELECT {USER_COLUMNS}, u.password_hash, c.id AS customer_id
            FROM app_user u
            LEFT JOIN customer c ON c.user_id = u.id
            WHERE lower(u.username) = lower($1)
            "
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            Ok(UserCredentials {
                user: row.user.try_into()?,
                password_hash: row.password_hash,
                customer_id: row.customer_id.map(CustomerId::new),
            })
        })
        .transpose()
    }

    /// All accounts registered with an email address, compared
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_email(&self, email: &Email) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user u WHERE lower(u.email) = lower($1) ORDER BY u.id"
        ))
        .bind(email.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether a username is already taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM app_user WHERE lower(username) = lower($1))",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create an account with the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        email: Option<&Email>,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user AS u (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING u.id, u.username, u.email, u.role, u.created_at
            ",
        )
        .bind(username)
        .bind(email.map(Email::as_str))
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "username already exists"))?;

        row.try_into()
    }

    /// Create a customer account and its linked customer profile.
    ///
    /// Both rows are inserted in one transaction: either both exist
    /// afterwards or neither does. The profile takes its name from the
    /// username and its email from the account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_customer_account(
        &self,
        username: &str,
        email: Option<&Email>,
        password_hash: &str,
    ) -> Result<(User, Customer), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user AS u (username, email, password_hash, role)
            VALUES ($1, $2, $3, 'customer')
            RETURNING u.id, u.username, u.email, u.role, u.created_at
            ",
        )
        .bind(username)
        .bind(email.map(Email::as_str))
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "username already exists"))?;

        let customer_row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customer (user_id, name, email)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, phone, email, profile_pic, created_at
            ",
        )
        .bind(user_row.id)
        .bind(username)
        .bind(email.map(Email::as_str))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user_row.try_into()?, customer_row.into()))
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE app_user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
