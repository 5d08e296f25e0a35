//! Order repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storekeep_core::{CustomerId, OrderId, OrderStatus, ProductId};

use super::RepositoryError;
use crate::models::{Order, OrderCounts};

/// Internal row type for order queries joined with customer and product names.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    customer_name: String,
    product_id: i32,
    product_name: String,
    status: OrderStatus,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            customer_name: row.customer_name,
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            status: row.status,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total: i64,
    delivered: i64,
    pending: i64,
}

/// Fields written when creating or editing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub status: OrderStatus,
    pub note: Option<String>,
}

const ORDER_SELECT: &str = r"
    SELECT o.id, o.customer_id, c.name AS customer_name,
           o.product_id, p.name AS product_name,
           o.status, o.note, o.created_at
    FROM customer_order o
    JOIN customer c ON c.id = o.customer_id
    JOIN product p ON p.id = o.product_id
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// The most recently created orders across all customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} ORDER BY o.created_at DESC, o.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every order placed by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.customer_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Order totals, across everyone or for a single customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(
        &self,
        customer_id: Option<CustomerId>,
    ) -> Result<OrderCounts, RepositoryError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'delivered') AS delivered,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM customer_order
            WHERE $1::INTEGER IS NULL OR customer_id = $1
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(OrderCounts {
            total: row.total,
            delivered: row.delivered,
            pending: row.pending,
        })
    }

    /// Insert several orders for one customer in a single transaction.
    ///
    /// Either every line is stored or none is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer or a product no
    /// longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_many(
        &self,
        customer_id: CustomerId,
        lines: &[(ProductId, OrderStatus)],
    ) -> Result<Vec<OrderId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(lines.len());

        for (product_id, status) in lines {
            let id: i32 = sqlx::query_scalar(
                r"
                INSERT INTO customer_order (customer_id, product_id, status)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(customer_id)
            .bind(product_id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "customer or product was removed"))?;
            ids.push(OrderId::new(id));
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Overwrite an order's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the customer or product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: OrderId, input: &OrderInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE customer_order
            SET customer_id = $2, product_id = $3, status = $4, note = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.customer_id)
        .bind(input.product_id)
        .bind(input.status)
        .bind(input.note.as_deref())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "customer or product was removed"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Permanently delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
