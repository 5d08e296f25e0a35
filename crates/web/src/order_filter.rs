//! Order filter for the customer detail page.
//!
//! Narrows a customer's orders by the query string. Every criterion is
//! optional and blank values are ignored; values that do not parse are
//! reported for re-display and that criterion is dropped. The result is
//! always a subset of the input, in input order.

use chrono::NaiveDate;
use serde::Deserialize;

use storekeep_core::{OrderStatus, ProductId};

use crate::forms::{FormErrors, INVALID_CHOICE, SelectOption, non_blank};
use crate::models::{Order, ProductChoice};

const INVALID_DATE: &str = "Enter a valid date.";

/// Raw query parameters, kept for re-display in the filter form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderFilterParams {
    pub product: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub note: String,
}

/// Parsed filter criteria, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub product: Option<ProductId>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Lowercased note fragment.
    pub note: Option<String>,
}

impl OrderFilterParams {
    /// Parse the criteria. Products must be among `products`.
    ///
    /// Returns the usable criteria and messages for the ones dropped.
    #[must_use]
    pub fn parse(&self, products: &[ProductChoice]) -> (OrderFilter, FormErrors) {
        let mut errors = FormErrors::new();
        let mut filter = OrderFilter::default();

        if let Some(raw) = non_blank(&self.product) {
            match raw.parse::<ProductId>() {
                Ok(id) if products.iter().any(|p| p.id == id) => filter.product = Some(id),
                _ => errors.add("product", INVALID_CHOICE),
            }
        }

        if let Some(raw) = non_blank(&self.status) {
            match raw.parse::<OrderStatus>() {
                Ok(status) => filter.status = Some(status),
                Err(_) => errors.add("status", INVALID_CHOICE),
            }
        }

        filter.start_date = parse_date(&mut errors, "start_date", &self.start_date);
        filter.end_date = parse_date(&mut errors, "end_date", &self.end_date);
        filter.note = non_blank(&self.note).map(str::to_lowercase);

        (filter, errors)
    }

    #[must_use]
    pub fn product_options(&self, products: &[ProductChoice]) -> Vec<SelectOption> {
        SelectOption::list_with_blank(
            products.iter().map(|p| (p.id, p.name.as_str())),
            self.product.trim(),
        )
    }

    #[must_use]
    pub fn status_options(&self) -> Vec<SelectOption> {
        SelectOption::list_with_blank(
            OrderStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
            self.status.trim(),
        )
    }
}

fn parse_date(errors: &mut FormErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let raw = non_blank(raw)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, INVALID_DATE);
            None
        }
    }
}

impl OrderFilter {
    /// Whether an order satisfies every criterion.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let date = order.created_at.date_naive();

        self.product.is_none_or(|id| order.product_id == id)
            && self.status.is_none_or(|status| order.status == status)
            && self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
            && self.note.as_deref().is_none_or(|needle| {
                order
                    .note
                    .as_deref()
                    .is_some_and(|note| note.to_lowercase().contains(needle))
            })
    }

    /// Keep the matching orders, preserving their order.
    #[must_use]
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        orders.into_iter().filter(|order| self.matches(order)).collect()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::models::order::tests::order;

    fn products() -> Vec<ProductChoice> {
        (1..=3)
            .map(|id| ProductChoice {
                id: ProductId::new(id),
                name: format!("Product {id}"),
            })
            .collect()
    }

    fn params(pairs: &[(&str, &str)]) -> OrderFilterParams {
        let mut params = OrderFilterParams::default();
        for (key, value) in pairs {
            let value = (*value).to_owned();
            match *key {
                "product" => params.product = value,
                "status" => params.status = value,
                "start_date" => params.start_date = value,
                "end_date" => params.end_date = value,
                "note" => params.note = value,
                _ => {}
            }
        }
        params
    }

    fn with_note(mut order: Order, note: &str) -> Order {
        order.note = Some(note.to_owned());
        order
    }

    #[test]
    fn test_blank_params_keep_everything() {
        let (filter, errors) = params(&[("product", ""), ("note", "  ")]).parse(&products());
        assert!(errors.is_empty());
        assert!(!filter.is_active());

        let orders = vec![order(1, 1, 1, OrderStatus::Pending), order(2, 1, 2, OrderStatus::Delivered)];
        assert_eq!(filter.apply(orders.clone()), orders);
    }

    #[test]
    fn test_product_and_status_combine() {
        let (filter, errors) =
            params(&[("product", "2"), ("status", "delivered")]).parse(&products());
        assert!(errors.is_empty());

        let orders = vec![
            order(1, 1, 2, OrderStatus::Pending),
            order(2, 1, 2, OrderStatus::Delivered),
            order(3, 1, 1, OrderStatus::Delivered),
        ];
        let kept = filter.apply(orders);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id.as_i32(), 2);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut early = order(1, 1, 1, OrderStatus::Pending);
        early.created_at = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap(); // 2024-01-01
        let mut late = order(2, 1, 1, OrderStatus::Pending);
        late.created_at = DateTime::<Utc>::from_timestamp(1_706_745_599, 0).unwrap(); // 2024-01-31 23:59:59

        let (filter, errors) =
            params(&[("start_date", "2024-01-01"), ("end_date", "2024-01-31")]).parse(&products());
        assert!(errors.is_empty());
        assert_eq!(filter.apply(vec![early.clone(), late.clone()]).len(), 2);

        let (filter, _) = params(&[("start_date", "2024-01-02")]).parse(&products());
        assert_eq!(filter.apply(vec![early, late]).len(), 1);
    }

    #[test]
    fn test_note_is_case_insensitive_substring() {
        let orders = vec![
            with_note(order(1, 1, 1, OrderStatus::Pending), "Leave at the DOOR"),
            order(2, 1, 1, OrderStatus::Pending),
            with_note(order(3, 1, 1, OrderStatus::Pending), "call first"),
        ];
        let (filter, _) = params(&[("note", "door")]).parse(&products());
        let kept = filter.apply(orders);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id.as_i32(), 1);
    }

    #[test]
    fn test_bad_values_are_reported_and_ignored() {
        let (filter, errors) = params(&[
            ("product", "42"),
            ("status", "shipped"),
            ("start_date", "yesterday"),
            ("end_date", "2024-02-30"),
        ])
        .parse(&products());

        assert_eq!(filter, OrderFilter::default());
        assert_eq!(errors.get("product"), [INVALID_CHOICE.to_owned()]);
        assert_eq!(errors.get("status"), [INVALID_CHOICE.to_owned()]);
        assert_eq!(errors.get("start_date"), [INVALID_DATE.to_owned()]);
        assert_eq!(errors.get("end_date"), [INVALID_DATE.to_owned()]);
    }

    fn arb_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    fn arb_orders() -> impl Strategy<Value = Vec<Order>> {
        prop::collection::vec(
            (1..=3i32, arb_status(), prop::option::of("[a-zA-Z ]{0,12}")),
            0..20,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (product, status, note))| {
                    let id = i32::try_from(i).unwrap_or(i32::MAX - 1) + 1;
                    let mut o = order(id, 1, product, status);
                    o.note = note;
                    o
                })
                .collect()
        })
    }

    fn arb_params() -> impl Strategy<Value = OrderFilterParams> {
        (
            prop::sample::select(vec!["", "1", "2", "3", "9", "x"]),
            prop::sample::select(vec!["", "pending", "delivered", "out_for_delivery", "bogus"]),
            prop::sample::select(vec!["", "2023-11-20", "2023-12-01", "not-a-date"]),
            prop::sample::select(vec!["", "2023-11-25", "2024-01-01"]),
            "[a-z]{0,2}",
        )
            .prop_map(|(product, status, start, end, note)| OrderFilterParams {
                product: product.to_owned(),
                status: status.to_owned(),
                start_date: start.to_owned(),
                end_date: end.to_owned(),
                note,
            })
    }

    proptest! {
        #[test]
        fn filtered_orders_are_an_ordered_subset(orders in arb_orders(), params in arb_params()) {
            let (filter, _) = params.parse(&products());
            let kept = filter.apply(orders.clone());

            prop_assert!(kept.len() <= orders.len());
            let mut remaining = orders.iter();
            for order in &kept {
                prop_assert!(remaining.any(|candidate| candidate == order));
                prop_assert!(filter.matches(order));
            }
        }

        #[test]
        fn dropped_orders_fail_the_filter(orders in arb_orders(), params in arb_params()) {
            let (filter, _) = params.parse(&products());
            let kept = filter.apply(orders.clone());
            for order in orders.iter().filter(|o| !kept.contains(o)) {
                prop_assert!(!filter.matches(order));
            }
        }
    }
}
