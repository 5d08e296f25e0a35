//! Template filters shared by every page that extends `base.html`.
//!
//! Askama resolves `|name` filters against a `filters` module in scope, so
//! each template module imports `crate::filters`.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::Datelike;

/// Stylesheet fingerprint computed by `build.rs`.
const STYLESHEET_FINGERPRINT: &str = env!("CSS_HASH");

/// Year shown in the page footer: `{{ ""|current_year }}`.
#[askama::filter_fn]
pub fn current_year(_input: impl Display, _values: &dyn askama::Values) -> askama::Result<i32> {
    Ok(chrono::Utc::now().year())
}

/// Cache-busting query value for `main.css`: `{{ ""|css_hash }}`.
#[askama::filter_fn]
pub fn css_hash(_input: impl Display, _values: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(STYLESHEET_FINGERPRINT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_short_hex_or_dev() {
        assert!(
            STYLESHEET_FINGERPRINT == "dev"
                || (STYLESHEET_FINGERPRINT.len() == 8
                    && STYLESHEET_FINGERPRINT.chars().all(|c| c.is_ascii_hexdigit()))
        );
    }
}
