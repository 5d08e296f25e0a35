//! Product and tag repository.
//!
//! Products are managed from the CLI; the site only reads them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storekeep_core::{Price, ProductCategory, ProductId, TagId};

use super::RepositoryError;
use crate::models::{Product, ProductChoice};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Price,
    category: ProductCategory,
    description: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            category: row.category,
            description: row.description,
            tags: row.tags,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChoiceRow {
    id: i32,
    name: String,
}

/// Repository for product and tag operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product with its tags, alphabetical by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.price, p.category, p.description, p.created_at,
                   COALESCE(
                       array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
                       '{}'
                   ) AS tags
            FROM product p
            LEFT JOIN product_tag pt ON pt.product_id = p.id
            LEFT JOIN tag t ON t.id = pt.tag_id
            GROUP BY p.id
            ORDER BY p.name, p.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Product ids and names for select boxes and form validation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_choices(&self) -> Result<Vec<ProductChoice>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChoiceRow>("SELECT id, name FROM product ORDER BY name, id")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductChoice {
                id: ProductId::new(row.id),
                name: row.name,
            })
            .collect())
    }

    /// Create a product and attach existing tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a tag name does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        price: Price,
        category: ProductCategory,
        description: Option<&str>,
        tags: &[String],
    ) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO product (name, price, category, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(name)
        .bind(price)
        .bind(category)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        for tag in tags {
            let attached = sqlx::query(
                r"
                INSERT INTO product_tag (product_id, tag_id)
                SELECT $1, id FROM tag WHERE name = $2
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;

            if attached.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        tx.commit().await?;
        Ok(ProductId::new(id))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if orders still reference it.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product has orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Create a tag, or return the existing one with that name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure_tag(&self, name: &str) -> Result<TagId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO tag (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(TagId::new(id))
    }
}
