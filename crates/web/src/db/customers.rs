//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storekeep_core::{CustomerId, UserId};

use super::RepositoryError;
use crate::models::customer::{PictureChange, ProfileUpdate};
use crate::models::{Customer, CustomerSummary};

/// Internal row type for `PostgreSQL` customer queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRow {
    id: i32,
    user_id: Option<i32>,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    profile_pic: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            name: row.name,
            phone: row.phone,
            email: row.email,
            profile_pic: row.profile_pic,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerSummaryRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    order_count: i64,
}

const CUSTOMER_COLUMNS: &str = "c.id, c.user_id, c.name, c.phone, c.email, c.profile_pic, c.created_at";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// All customers, alphabetical, for select boxes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer c ORDER BY c.name, c.id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// All customers with their order counts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_order_counts(&self) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerSummaryRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}, COUNT(o.id) AS order_count
            FROM customer c
            LEFT JOIN customer_order o ON o.customer_id = c.id
            GROUP BY c.id
            ORDER BY c.created_at, c.id
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CustomerSummary {
                customer: row.customer.into(),
                order_count: row.order_count,
            })
            .collect())
    }

    /// Total number of customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(self.pool)
            .await?)
    }

    /// Create a customer that is not linked to an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customer (name, phone, email)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, phone, email, profile_pic, created_at
            ",
        )
        .bind(name)
        .bind(phone)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply an account-settings update and return the stored customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        update: &ProfileUpdate,
    ) -> Result<Customer, RepositoryError> {
        let (replace_pic, new_pic) = match &update.profile_pic {
            PictureChange::Keep => (false, None),
            PictureChange::Replace(path) => (true, Some(path.as_str())),
            PictureChange::Clear => (true, None),
        };

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE customer
            SET name = $2,
                phone = $3,
                email = $4,
                profile_pic = CASE WHEN $5 THEN $6 ELSE profile_pic END
            WHERE id = $1
            RETURNING id, user_id, name, phone, email, profile_pic, created_at
            ",
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.phone.as_deref())
        .bind(update.email.as_deref())
        .bind(replace_pic)
        .bind(new_pic)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a customer. Their orders are removed by the foreign key cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
