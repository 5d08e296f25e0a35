//! Non-negative product price with two decimal places.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is not a number: {0:?}")]
    Invalid(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price must be below {max}")]
    TooLarge {
        /// Exclusive upper bound (NUMERIC(10,2)).
        max: Decimal,
    },
}

/// A catalog price in dollars.
///
/// Stored as `NUMERIC(10,2)`; parsing rounds to cents.
///
/// ```
/// use storekeep_core::Price;
///
/// let price: Price = "19.5".parse().unwrap();
/// assert_eq!(price.to_string(), "$19.50");
/// assert!("-1".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Upper bound imposed by the column's precision.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 2);

    /// Validate a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] or [`PriceError::TooLarge`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let amount = amount.round_dp(2);
        if amount >= Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        Ok(Self(amount))
    }

    /// Build a price from whole cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_max_is_numeric_10_2_bound() {
        assert_eq!(Price::MAX, Decimal::from(100_000_000));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("12".parse::<Price>().unwrap().to_string(), "$12.00");
        assert_eq!("$3.456".parse::<Price>().unwrap().to_string(), "$3.46");
        assert_eq!("0".parse::<Price>().unwrap().to_string(), "$0.00");
        assert_eq!(Price::from_cents(1999).to_string(), "$19.99");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!("-0.01".parse::<Price>(), Err(PriceError::Negative));
        assert!(matches!(
            "abc".parse::<Price>(),
            Err(PriceError::Invalid(_))
        ));
        assert!(matches!(
            "100000000".parse::<Price>(),
            Err(PriceError::TooLarge { .. })
        ));
    }
}
