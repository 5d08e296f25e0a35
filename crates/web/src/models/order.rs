//! Order domain types.

use chrono::{DateTime, Utc};

use storekeep_core::{CustomerId, OrderId, OrderStatus, ProductId};

/// An order joined with the names of its customer and product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creation date for display, e.g. `Jan 5, 2024`.
    #[must_use]
    pub fn created_on(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }
}

/// Dashboard totals over a set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderCounts {
    pub total: i64,
    pub delivered: i64,
    pub pending: i64,
}

impl OrderCounts {
    /// Tally a slice of orders.
    #[must_use]
    pub fn tally(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut counts, order| {
            counts.total += 1;
            match order.status {
                OrderStatus::Delivered => counts.delivered += 1,
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::OutForDelivery => {}
            }
            counts
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an order for tests without touching the database.
    pub(crate) fn order(id: i32, customer: i32, product: i32, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: CustomerId::new(customer),
            customer_name: format!("Customer {customer}"),
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            status,
            note: None,
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + i64::from(id) * 86_400, 0)
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_tally_counts_each_status() {
        let orders = vec![
            order(1, 1, 1, OrderStatus::Pending),
            order(2, 1, 2, OrderStatus::Delivered),
            order(3, 1, 2, OrderStatus::OutForDelivery),
            order(4, 2, 1, OrderStatus::Pending),
        ];

        let counts = OrderCounts::tally(&orders);
        assert_eq!(
            counts,
            OrderCounts {
                total: 4,
                delivered: 1,
                pending: 2
            }
        );
    }
}
