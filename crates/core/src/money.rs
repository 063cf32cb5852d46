use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Not a price: '{0}'")]
    Unparseable(String),
}

/// Decimal amount used for summing stored prices. Stored prices themselves stay
/// as text; this type only exists for arithmetic and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Parse price text such as `"2.50"`, `"$2.50"` or `"1,234.56"`.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let clean: String = s
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        Decimal::from_str(clean.trim())
            .map(Money::from_decimal)
            .map_err(|_| MoneyError::Unparseable(s.to_string()))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// `None` when the sum leaves the decimal range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Line total for `quantity` units. `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_and_prefixed() {
        assert_eq!(Money::parse("2.50").unwrap().to_string(), "$2.50");
        assert_eq!(Money::parse("$2.50").unwrap().to_string(), "$2.50");
        assert_eq!(Money::parse(" 1,234.56 ").unwrap().to_string(), "$1234.56");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            Money::parse("two fifty"),
            Err(MoneyError::Unparseable("two fifty".into()))
        );
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn sum_with_quantity() {
        let total = [("2.50", 2), ("1.20", 1)]
            .iter()
            .try_fold(Money::zero(), |acc, (p, q)| {
                acc.checked_add(Money::parse(p).unwrap().checked_mul(*q)?)
            })
            .unwrap();
        assert_eq!(total.to_string(), "$6.20");
    }

    #[test]
    fn huge_quantity_overflows_to_none() {
        let price = Money::parse("100000000000").unwrap();
        assert_eq!(price.checked_mul(i64::MAX), None);
        assert_eq!(price.checked_mul(3).map(|m| m.to_string()), Some("$300000000000.00".into()));
    }

    #[test]
    fn add_near_limit_overflows_to_none() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max.checked_add(Money::parse("1").unwrap()), None);
        assert_eq!(max.checked_add(Money::zero()), Some(max));
    }

    #[test]
    fn zero_display() {
        assert!(Money::zero().is_zero());
        assert_eq!(Money::zero().to_string(), "$0.00");
    }
}
