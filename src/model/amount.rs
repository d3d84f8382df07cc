//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are parsed leniently from
//! user input (an optional leading currency symbol and thousands separators are accepted) and are
//! always stored as a plain decimal string so that documents stay stable across locales.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Represents a monetary amount.
///
/// # Examples
///
/// Parsing with a currency symbol and commas:
/// ```
/// # use spendly::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("R1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "1,250.50");
/// assert_eq!(amount.display_with("R"), "R1,250.50");
/// ```
///
/// Non-numeric input is rejected:
/// ```
/// # use spendly::model::Amount;
/// # use std::str::FromStr;
/// assert!(Amount::from_str("lunch").is_err());
/// assert!(Amount::from_str("").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Formats the amount with two decimal places, thousands separators and the given currency
    /// `symbol` placed after the sign, e.g. `-R1,000.00`.
    pub fn display_with(&self, symbol: &str) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs().to_f64().unwrap_or_default();
        format!("{sign}{symbol}{}", format_num::format_num!(",.2", abs))
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: Option<rust_decimal::Error>,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AmountError({:?}, {:?})", self.input, self.source)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount", self.input)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |source| AmountError {
            input: s.to_string(),
            source,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(err(None));
        }

        // Split off the sign so that "-R50" and "R-50" are both understood
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(after_minus) => (true, after_minus.trim_start()),
            None => (false, trimmed),
        };

        // Drop a leading currency symbol, e.g. "R" or "$"
        let digits_start = rest
            .find(|c: char| c.is_ascii_digit() || c == '.' || c == '-')
            .ok_or_else(|| err(None))?;
        let symbol = &rest[..digits_start];
        if symbol.chars().count() > 3 {
            return Err(err(None));
        }

        // Remove commas (thousand separators)
        let number = rest[digits_start..].replace(',', "");
        if negative && number.starts_with('-') {
            return Err(err(None));
        }
        let value = Decimal::from_str(&number).map_err(|e| err(Some(e)))?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_with(""))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Stored without symbol or separators
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::new(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

// Arithmetic saturates at the bounds of `Decimal` instead of panicking.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_with_currency_symbol() {
        assert_eq!(Amount::from_str("R120.5").unwrap().value(), dec("120.5"));
        assert_eq!(Amount::from_str("$7").unwrap().value(), dec("7"));
    }

    #[test]
    fn test_parse_negative_with_symbol() {
        let amount = Amount::from_str("-R50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
        assert!(amount.is_negative());
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str("R1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_whitespace() {
        let amount = Amount::from_str("  899.90  ").unwrap();
        assert_eq!(amount.value(), dec("899.90"));
    }

    #[test]
    fn test_parse_rejects_empty_and_words() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("   ").is_err());
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("12abc").is_err());
    }

    #[test]
    fn test_parse_rejects_double_sign() {
        assert!(Amount::from_str("--50").is_err());
        assert!(Amount::from_str("-R-50").is_err());
        assert_eq!(Amount::from_str("R-50").unwrap().value(), dec("-50"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from(2500).to_string(), "2,500.00");
        assert_eq!(Amount::from_str("-45.8").unwrap().to_string(), "-45.80");
        assert_eq!(Amount::ZERO.display_with("R"), "R0.00");
    }

    #[test]
    fn test_serialize_is_plain_decimal() {
        let amount = Amount::from_str("R3,330.20").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"3330.2\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_sum_and_sub() {
        let amounts = [Amount::from(100), Amount::from(30), Amount::from(20)];
        let total: Amount = amounts.iter().sum();
        assert_eq!(total, Amount::from(150));
        assert_eq!(total - Amount::from(200), Amount::from(-50));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!(max + max, max);
        let mut total = max;
        total += Amount::from(1);
        assert_eq!(total, max);
        assert_eq!(Amount::new(Decimal::MIN) - max, Amount::new(Decimal::MIN));
        let total: Amount = [max, max, Amount::from(5)].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_ordering() {
        assert!(Amount::from(30) < Amount::from(50));
    }
}
