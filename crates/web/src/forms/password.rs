//! Password validation and the password reset forms.

use serde::Deserialize;

use storekeep_core::Email;

use super::{FormErrors, REQUIRED, non_blank};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length. Also bounds the quadratic similarity check.
pub const MAX_PASSWORD_LENGTH: usize = 256;

/// Similarity ratio at or above which a password is rejected as too close
/// to the username or email.
const MAX_SIMILARITY: f64 = 0.7;

/// Passwords rejected outright.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "1234567", "12345678", "123456789", "1234567890", "password", "password1",
    "password123", "passw0rd", "qwerty", "qwerty123", "qwertyuiop", "abc123", "abcd1234",
    "111111", "000000", "iloveyou", "admin", "admin123", "welcome", "welcome1", "letmein",
    "monkey", "dragon", "football", "baseball", "sunshine", "princess", "superman",
    "trustno1", "master", "shadow", "starwars", "whatever", "freedom", "zaq12wsx",
    "1q2w3e4r", "1qaz2wsx", "asdfghjkl", "changeme", "secret", "default", "login",
    "hello123", "computer", "michael", "jennifer", "charlie", "donald", "access",
];

pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

/// Check a password against the site rules.
///
/// `identity` holds values the password must not resemble (username, email).
/// Returns every failing rule's message.
#[must_use]
pub fn password_problems(password: &str, identity: &[&str]) -> Vec<String> {
    let length = password.chars().count();
    if length > MAX_PASSWORD_LENGTH {
        return vec![format!(
            "This password is too long. It must contain at most {MAX_PASSWORD_LENGTH} characters."
        )];
    }

    let mut problems = Vec::new();
    let lowered = password.to_lowercase();

    if identity
        .iter()
        .filter(|value| !value.is_empty())
        .any(|value| is_too_similar(&lowered, &value.to_lowercase()))
    {
        problems.push("The password is too similar to the username.".to_owned());
    }
    if length < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if COMMON_PASSWORDS.contains(&lowered.trim()) {
        problems.push("This password is too common.".to_owned());
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_owned());
    }

    problems
}

/// Whether `password` resembles `value` or any of its `@.+-_` separated parts.
fn is_too_similar(password: &str, value: &str) -> bool {
    std::iter::once(value)
        .chain(value.split(['@', '.', '+', '-', '_']))
        .filter(|part| part.chars().count() >= 3)
        .any(|part| similarity(password, part) >= MAX_SIMILARITY)
}

/// `2 * M / T`, where `M` is the total length of common substrings found by
/// repeatedly taking the longest match and `T` the combined length.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = (2 * matching_chars(&a, &b)) as f64 / total as f64;
    ratio
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (len, a_start, b_start) = longest_common_substring(a, b);
    if len == 0 {
        return 0;
    }
    let (a_left, a_rest) = a.split_at(a_start);
    let (b_left, b_rest) = b.split_at(b_start);
    len + matching_chars(a_left, b_left)
        + matching_chars(a_rest.get(len..).unwrap_or_default(), b_rest.get(len..).unwrap_or_default())
}

/// Length and start offsets of the longest common substring.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = previous.get(j).copied().unwrap_or(0) + 1;
                if let Some(slot) = current.get_mut(j + 1) {
                    *slot = run;
                }
                if run > best.0 {
                    best = (run, i + 1 - run, j + 1 - run);
                }
            }
        }
        previous = current;
    }
    best
}

/// Check a pair of new-password fields, recording messages under `field2`.
pub(crate) fn check_new_password(
    errors: &mut FormErrors,
    (field1, password1): (&str, &str),
    (field2, password2): (&str, &str),
    identity: &[&str],
) {
    if password1.is_empty() {
        errors.add(field1, REQUIRED);
    }
    if password2.is_empty() {
        errors.add(field2, REQUIRED);
    }
    if password1.is_empty() || password2.is_empty() {
        return;
    }
    if password1 != password2 {
        errors.add(field2, PASSWORD_MISMATCH);
        return;
    }
    for problem in password_problems(password2, identity) {
        errors.add(field2, problem);
    }
}

/// "Forgot password" form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetRequestForm {
    pub email: String,
}

impl PasswordResetRequestForm {
    /// # Errors
    ///
    /// Returns the field messages when the email is blank or malformed.
    pub fn validate(&self) -> Result<Email, FormErrors> {
        let mut errors = FormErrors::new();
        let Some(raw) = non_blank(&self.email) else {
            errors.add("email", REQUIRED);
            return Err(errors);
        };
        Email::parse(raw).map_err(|_| {
            errors.add("email", "Enter a valid email address.");
            errors
        })
    }
}

/// New password form reached from a reset link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

impl SetPasswordForm {
    /// Validate the new password for the account being reset.
    ///
    /// # Errors
    ///
    /// Returns the field messages when the passwords differ or fail a rule.
    pub fn validate(&self, username: &str, email: Option<&str>) -> Result<&str, FormErrors> {
        let mut errors = FormErrors::new();
        let identity = [username, email.unwrap_or_default()];
        check_new_password(
            &mut errors,
            ("new_password1", &self.new_password1),
            ("new_password2", &self.new_password2),
            &identity,
        );
        errors.into_result(self.new_password2.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_good_password_passes() {
        assert!(password_problems("tangerine-Orbit-42", &["peter"]).is_empty());
    }

    #[test]
    fn test_each_rule_reports() {
        let short = password_problems("a1b2", &[]);
        assert_eq!(short.len(), 1);
        assert!(short[0].contains("too short"));

        assert!(
            password_problems("password123", &[])
                .iter()
                .any(|p| p == "This password is too common.")
        );
        assert!(
            password_problems("4815162342", &[])
                .iter()
                .any(|p| p == "This password is entirely numeric.")
        );
        assert!(
            password_problems("peterparker1", &["peterparker"])
                .iter()
                .any(|p| p.contains("too similar"))
        );
    }

    #[test]
    fn test_overlong_password_is_rejected_before_similarity() {
        let long = "p".repeat(1_000_000);
        let problems = password_problems(&long, &["peter", "peter@example.com"]);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("too long"));

        let limit = "tangerine-Orbit-42".repeat(20).chars().take(MAX_PASSWORD_LENGTH).collect::<String>();
        assert!(password_problems(&limit, &["peter"]).is_empty());
    }

    #[test]
    fn test_similarity_checks_email_parts() {
        assert!(is_too_similar("margaret99", "margaret@example.com"));
        assert!(!is_too_similar("tangerine-orbit", "margaret@example.com"));
    }

    #[test]
    fn test_similarity_ratio() {
        assert!((similarity("abcd", "abcd") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("abcd", "wxyz").abs() < f64::EPSILON);
        assert!((similarity("abcd", "bcde") - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_password_form() {
        let form = SetPasswordForm {
            new_password1: "tangerine-Orbit-42".to_owned(),
            new_password2: "tangerine-Orbit-43".to_owned(),
        };
        let errors = form.validate("peter", None).unwrap_err();
        assert_eq!(errors.get("new_password2"), [PASSWORD_MISMATCH.to_owned()]);

        let form = SetPasswordForm {
            new_password1: "tangerine-Orbit-42".to_owned(),
            new_password2: "tangerine-Orbit-42".to_owned(),
        };
        assert_eq!(form.validate("peter", None).unwrap(), "tangerine-Orbit-42");
    }

    #[test]
    fn test_reset_request_form() {
        let form = PasswordResetRequestForm {
            email: " Peter@Example.COM ".to_owned(),
        };
        assert_eq!(form.validate().unwrap().as_str(), "Peter@example.com");

        let blank = PasswordResetRequestForm::default();
        assert_eq!(blank.validate().unwrap_err().get("email"), [REQUIRED.to_owned()]);

        let bad = PasswordResetRequestForm {
            email: "not-an-email".to_owned(),
        };
        assert!(bad.validate().unwrap_err().has("email"));
    }

    proptest! {
        #[test]
        fn similarity_is_symmetric_and_bounded(a in "[a-z0-9]{0,12}", b in "[a-z0-9]{0,12}") {
            let ab = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - similarity(&b, &a)).abs() < 1e-9);
        }
    }
}
