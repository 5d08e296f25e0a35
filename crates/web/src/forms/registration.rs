//! Account registration form.

use serde::Deserialize;

use storekeep_core::Email;

use super::customer::FIELD_MAX_LEN;
use super::password::check_new_password;
use super::{FormErrors, REQUIRED, check_max_len, non_blank};

/// Longest username accepted.
pub const USERNAME_MAX_LEN: usize = 150;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

const USERNAME_RULES: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// Submitted registration fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Registration data that passed every check not needing the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub email: Option<Email>,
    pub password: String,
}

/// Whether a username only uses letters, digits and `@.+-_`.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl RegistrationForm {
    /// Validate everything except username uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate(&self) -> Result<ValidRegistration, FormErrors> {
        let mut errors = FormErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else {
            if username.chars().count() > USERNAME_MAX_LEN {
                errors.add(
                    "username",
                    format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
                );
            }
            if !is_valid_username(username) {
                errors.add("username", USERNAME_RULES);
            }
        }

        // The address is copied onto the customer profile, whose column is shorter
        let email = if self.email.trim().chars().count() > FIELD_MAX_LEN {
            check_max_len(&mut errors, "email", self.email.trim(), FIELD_MAX_LEN);
            None
        } else {
            match non_blank(&self.email).map(Email::parse).transpose() {
                Ok(email) => email,
                Err(_) => {
                    errors.add("email", "Enter a valid email address.");
                    None
                }
            }
        };

        let identity = [username, self.email.trim()];
        check_new_password(
            &mut errors,
            ("password1", &self.password1),
            ("password2", &self.password2),
            &identity,
        );

        errors.into_result(ValidRegistration {
            username: username.to_owned(),
            email,
            password: self.password2.clone(),
        })
    }
}
