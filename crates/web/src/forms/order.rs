//! Order form and the multi-row order formset.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use storekeep_core::{CustomerId, OrderStatus, ProductId};

use super::{FormErrors, INVALID_CHOICE, REQUIRED, SelectOption, check_max_len, non_blank};
use crate::db::orders::OrderInput;
use crate::models::{Customer, Order, ProductChoice};

/// Longest note accepted on an order.
pub const NOTE_MAX_LEN: usize = 1000;

/// Blank rows rendered by a fresh formset.
pub const EXTRA_FORMS: usize = 3;

/// Most rows accepted in one submission.
pub const MAX_FORMS: usize = 10;

/// Field-name prefix of formset rows.
pub const FORMSET_PREFIX: &str = "form";

const MANAGEMENT_ERROR: &str = "ManagementForm data is missing or has been tampered with.";

/// Parse a select value and check it against the offered choices.
fn parse_choice<T: FromStr>(
    errors: &mut FormErrors,
    field: &str,
    raw: &str,
    offered: impl Fn(&T) -> bool,
) -> Option<T> {
    let Some(raw) = non_blank(raw) else {
        errors.add(field, REQUIRED);
        return None;
    };
    match raw.parse::<T>() {
        Ok(value) if offered(&value) => Some(value),
        _ => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

fn product_options(products: &[ProductChoice], current: &str) -> Vec<SelectOption> {
    SelectOption::list_with_blank(products.iter().map(|p| (p.id, p.name.as_str())), current)
}

fn status_options(current: &str) -> Vec<SelectOption> {
    SelectOption::list_with_blank(
        OrderStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
        current,
    )
}

// =============================================================================
// Order form (update)
// =============================================================================

/// Submitted fields of the order edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub customer: String,
    pub product: String,
    pub status: String,
    pub note: String,
}

impl OrderForm {
    /// Prefill the form from a stored order.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            customer: order.customer_id.to_string(),
            product: order.product_id.to_string(),
            status: order.status.as_str().to_owned(),
            note: order.note.clone().unwrap_or_default(),
        }
    }

    /// Validate against the customers and products that exist.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(
        &self,
        customers: &[Customer],
        products: &[ProductChoice],
    ) -> Result<OrderInput, FormErrors> {
        let mut errors = FormErrors::new();

        let customer_id = parse_choice::<CustomerId>(&mut errors, "customer", &self.customer, |id| {
            customers.iter().any(|c| c.id == *id)
        });
        let product_id = parse_choice::<ProductId>(&mut errors, "product", &self.product, |id| {
            products.iter().any(|p| p.id == *id)
        });
        let status =
            parse_choice::<OrderStatus>(&mut errors, "status", &self.status, |_| true);
        check_max_len(&mut errors, "note", self.note.trim(), NOTE_MAX_LEN);

        match (customer_id, product_id, status) {
            (Some(customer_id), Some(product_id), Some(status)) if errors.is_empty() => {
                Ok(OrderInput {
                    customer_id,
                    product_id,
                    status,
                    note: non_blank(&self.note).map(str::to_owned),
                })
            }
            _ => Err(errors),
        }
    }

    #[must_use]
    pub fn customer_options(&self, customers: &[Customer]) -> Vec<SelectOption> {
        SelectOption::list_with_blank(
            customers.iter().map(|c| (c.id, c.name.as_str())),
            self.customer.trim(),
        )
    }

    #[must_use]
    pub fn product_options(&self, products: &[ProductChoice]) -> Vec<SelectOption> {
        product_options(products, self.product.trim())
    }

    #[must_use]
    pub fn status_options(&self) -> Vec<SelectOption> {
        status_options(self.status.trim())
    }
}

// =============================================================================
// Order formset (create)
// =============================================================================

/// One submitted formset row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLine {
    pub product: String,
    pub status: String,
}

impl OrderLine {
    fn is_blank(&self) -> bool {
        non_blank(&self.product).is_none() && non_blank(&self.status).is_none()
    }
}

/// Rows of a submitted order formset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFormset {
    pub lines: Vec<OrderLine>,
    management_error: Option<String>,
}

/// Errors for the formset as a whole and for each row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormsetErrors {
    pub non_form: Vec<String>,
    /// One entry per submitted row, empty for valid rows.
    pub rows: Vec<FormErrors>,
}

/// A formset row ready for the template.
#[derive(Debug, Clone)]
pub struct FormsetRowView {
    pub index: usize,
    pub product_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

impl Default for OrderFormset {
    fn default() -> Self {
        Self::blank()
    }
}

impl OrderFormset {
    /// A fresh formset with [`EXTRA_FORMS`] blank rows.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            lines: vec![OrderLine::default(); EXTRA_FORMS],
            management_error: None,
        }
    }

    /// Read rows from urlencoded `(name, value)` pairs.
    ///
    /// Rows are `form-{i}-product` and `form-{i}-status` for `i` below
    /// `form-TOTAL_FORMS`. Bad management data is kept as a formset error
    /// and the rows fall back to a blank formset.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let fields: HashMap<&str, &str> = pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        let total = fields
            .get(format!("{FORMSET_PREFIX}-TOTAL_FORMS").as_str())
            .and_then(|raw| raw.trim().parse::<usize>().ok());

        let Some(total) = total else {
            return Self {
                management_error: Some(MANAGEMENT_ERROR.to_owned()),
                ..Self::blank()
            };
        };

        if total > MAX_FORMS {
            return Self {
                management_error: Some(format!("Please submit at most {MAX_FORMS} forms.")),
                ..Self::blank()
            };
        }

        let field = |index: usize, name: &str| {
            fields
                .get(format!("{FORMSET_PREFIX}-{index}-{name}").as_str())
                .map_or_else(String::new, |value| (*value).to_owned())
        };

        let lines = (0..total)
            .map(|index| OrderLine {
                product: field(index, "product"),
                status: field(index, "status"),
            })
            .collect();

        Self {
            lines,
            management_error: None,
        }
    }

    /// Validate every non-blank row.
    ///
    /// Blank rows are skipped. Nothing is returned unless every row is valid.
    ///
    /// # Errors
    ///
    /// Returns formset and per-row errors when anything is invalid.
    pub fn validate(
        &self,
        products: &[ProductChoice],
    ) -> Result<Vec<(ProductId, OrderStatus)>, FormsetErrors> {
        let mut errors = FormsetErrors {
            non_form: self.management_error.iter().cloned().collect(),
            rows: Vec::with_capacity(self.lines.len()),
        };
        let mut valid = Vec::new();

        for line in &self.lines {
            let mut row_errors = FormErrors::new();
            if !line.is_blank() {
                let product = parse_choice::<ProductId>(&mut row_errors, "product", &line.product, |id| {
                    products.iter().any(|p| p.id == *id)
                });
                let status =
                    parse_choice::<OrderStatus>(&mut row_errors, "status", &line.status, |_| true);
                if let (Some(product), Some(status)) = (product, status) {
                    valid.push((product, status));
                }
            }
            errors.rows.push(row_errors);
        }

        if errors.non_form.is_empty() && errors.rows.iter().all(FormErrors::is_empty) {
            Ok(valid)
        } else {
            Err(errors)
        }
    }

    /// Rows with their select options and any errors, for rendering.
    #[must_use]
    pub fn rows(
        &self,
        products: &[ProductChoice],
        errors: Option<&FormsetErrors>,
    ) -> Vec<FormsetRowView> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| FormsetRowView {
                index,
                product_options: product_options(products, line.product.trim()),
                status_options: status_options(line.status.trim()),
                errors: errors
                    .and_then(|e| e.rows.get(index))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Value for the `form-TOTAL_FORMS` hidden field.
    #[must_use]
    pub fn total_forms(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn products() -> Vec<ProductChoice> {
        vec![
            ProductChoice {
                id: ProductId::new(1),
                name: "BBQ Grill".to_owned(),
            },
            ProductChoice {
                id: ProductId::new(2),
                name: "Ball".to_owned(),
            },
        ]
    }

    fn customers() -> Vec<Customer> {
        vec![Customer {
            id: CustomerId::new(5),
            user_id: None,
            name: "Peter".to_owned(),
            phone: None,
            email: None,
            profile_pic: None,
            created_at: Utc::now(),
        }]
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_order_form_accepts_known_choices() {
        let form = OrderForm {
            customer: "5".to_owned(),
            product: "2".to_owned(),
            status: "delivered".to_owned(),
            note: "  leave at door ".to_owned(),
        };
        let input = form.validate(&customers(), &products()).unwrap();
        assert_eq!(input.customer_id, CustomerId::new(5));
        assert_eq!(input.product_id, ProductId::new(2));
        assert_eq!(input.status, OrderStatus::Delivered);
        assert_eq!(input.note.as_deref(), Some("leave at door"));
    }

    #[test]
    fn test_order_form_rejects_unknown_and_missing() {
        let form = OrderForm {
            customer: "99".to_owned(),
            product: String::new(),
            status: "lost".to_owned(),
            note: "x".repeat(NOTE_MAX_LEN + 1),
        };
        let errors = form.validate(&customers(), &products()).unwrap_err();
        assert_eq!(errors.get("customer"), [INVALID_CHOICE.to_owned()]);
        assert_eq!(errors.get("product"), [REQUIRED.to_owned()]);
        assert_eq!(errors.get("status"), [INVALID_CHOICE.to_owned()]);
        assert!(errors.has("note"));
    }

    #[test]
    fn test_order_form_options_follow_current_values() {
        let form = OrderForm {
            status: "pending".to_owned(),
            ..OrderForm::default()
        };
        let statuses = form.status_options();
        assert_eq!(statuses.len(), 4);
        assert!(statuses[1].selected);
        assert_eq!(statuses[2].label, "Out for delivery");
    }

    #[test]
    fn test_blank_formset_has_extra_rows() {
        let formset = OrderFormset::blank();
        assert_eq!(formset.total_forms(), EXTRA_FORMS);
        assert_eq!(formset.validate(&products()).unwrap(), vec![]);
    }

    #[test]
    fn test_formset_skips_blank_rows() {
        let formset = OrderFormset::from_pairs(&pairs(&[
            ("form-TOTAL_FORMS", "3"),
            ("form-0-product", "1"),
            ("form-0-status", "pending"),
            ("form-1-product", ""),
            ("form-1-status", ""),
            ("form-2-product", "2"),
            ("form-2-status", "out_for_delivery"),
        ]));

        let lines = formset.validate(&products()).unwrap();
        assert_eq!(
            lines,
            vec![
                (ProductId::new(1), OrderStatus::Pending),
                (ProductId::new(2), OrderStatus::OutForDelivery),
            ]
        );
    }

    #[test]
    fn test_formset_one_bad_row_rejects_all() {
        let formset = OrderFormset::from_pairs(&pairs(&[
            ("form-TOTAL_FORMS", "2"),
            ("form-0-product", "1"),
            ("form-0-status", "pending"),
            ("form-1-product", "2"),
            ("form-1-status", ""),
        ]));

        let errors = formset.validate(&products()).unwrap_err();
        assert!(errors.non_form.is_empty());
        assert!(errors.rows[0].is_empty());
        assert_eq!(errors.rows[1].get("status"), [REQUIRED.to_owned()]);

        let rows = formset.rows(&products(), Some(&errors));
        assert_eq!(rows.len(), 2);
        assert!(rows[1].errors.has("status"));
        assert!(rows[1].product_options[2].selected);
    }

    #[test]
    fn test_formset_management_data_is_required() {
        let formset = OrderFormset::from_pairs(&pairs(&[("form-0-product", "1")]));
        let errors = formset.validate(&products()).unwrap_err();
        assert_eq!(errors.non_form, vec![MANAGEMENT_ERROR.to_owned()]);
        assert_eq!(formset.total_forms(), EXTRA_FORMS);

        let tampered = OrderFormset::from_pairs(&pairs(&[("form-TOTAL_FORMS", "lots")]));
        assert!(tampered.validate(&products()).is_err());
    }

    #[test]
    fn test_formset_row_limit() {
        let formset = OrderFormset::from_pairs(&pairs(&[("form-TOTAL_FORMS", "11")]));
        let errors = formset.validate(&products()).unwrap_err();
        assert_eq!(errors.non_form, vec!["Please submit at most 10 forms.".to_owned()]);

        let at_limit = OrderFormset::from_pairs(&pairs(&[("form-TOTAL_FORMS", "10")]));
        assert_eq!(at_limit.total_forms(), MAX_FORMS);
        assert!(at_limit.validate(&products()).unwrap().is_empty());
    }
}
