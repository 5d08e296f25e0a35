//! HTML form binding and validation.
//!
//! Each form has a raw struct holding exactly what the browser sent and a
//! `validate` function that either produces typed values or a
//! [`FormErrors`] for re-display next to the fields. Checks that need the
//! database (username uniqueness, existence of rows) are done against data
//! the handler loads first, or added to the errors by the handler.

pub mod customer;
pub mod order;
pub mod password;
pub mod registration;

use std::collections::BTreeMap;

/// Message for a required field left blank.
pub const REQUIRED: &str = "This field is required.";

/// Message for a choice that is not among the offered options.
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Field-level and form-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a message to a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Attach a message to the form as a whole.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Messages for one field; empty when the field is valid.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a field has any message.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    #[must_use]
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// `Ok(value)` when no message was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when any were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// One `<option>` of a `<select>`, with the selection already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Build options from `(value, label)` pairs, selecting the one whose
    /// value equals `current`.
    pub fn list<I, V, L>(choices: I, current: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = (V, L)>,
        V: ToString,
        L: Into<String>,
    {
        choices
            .into_iter()
            .map(|(value, label)| {
                let value = value.to_string();
                let selected = value == current;
                Self {
                    value,
                    label: label.into(),
                    selected,
                }
            })
            .collect()
    }

    /// Same as [`SelectOption::list`] with a leading blank `---------` entry.
    pub fn list_with_blank<I, V, L>(choices: I, current: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = (V, L)>,
        V: ToString,
        L: Into<String>,
    {
        let mut options = vec![Self {
            value: String::new(),
            label: "---------".to_owned(),
            selected: current.is_empty(),
        }];
        options.extend(Self::list(choices, current));
        options
    }
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Record an error when `value` is longer than `max` characters.
pub(crate) fn check_max_len(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_errors_collects_per_field() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());
        errors.add("name", REQUIRED);
        errors.add("name", "second");
        errors.add_non_field("whole form");

        assert_eq!(errors.get("name").len(), 2);
        assert!(errors.has("name"));
        assert!(!errors.has("phone"));
        assert!(errors.get("phone").is_empty());
        assert_eq!(errors.non_field(), ["whole form".to_owned()]);
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_select_options_mark_current_value() {
        let options = SelectOption::list_with_blank([(1, "Ball"), (2, "Tent")], "2");
        assert_eq!(options.len(), 3);
        assert!(!options[0].selected);
        assert_eq!(options[2].value, "2");
        assert!(options[2].selected);

        let blank = SelectOption::list_with_blank([(1, "Ball")], "");
        assert!(blank[0].selected);
    }

    #[test]
    fn test_max_len_counts_characters() {
        let mut errors = FormErrors::new();
        check_max_len(&mut errors, "name", "ééé", 3);
        assert!(errors.is_empty());
        check_max_len(&mut errors, "name", "éééé", 3);
        assert_eq!(
            errors.get("name"),
            ["Ensure this value has at most 3 characters (it has 4).".to_owned()]
        );
    }
}
