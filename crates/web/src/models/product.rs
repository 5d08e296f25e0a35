//! Product catalog types.

use chrono::{DateTime, Utc};

use storekeep_core::{Price, ProductCategory, ProductId};

/// A catalog product with its tag names.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: ProductCategory,
    pub description: Option<String>,
    /// Tag names, alphabetical.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal product data for select boxes and form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChoice {
    pub id: ProductId,
    pub name: String,
}
