//! Monetary amounts carried by tag 54.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pix::error::{PixError, PixResult};

/// Largest amount tag 54 can carry (13 characters: `9999999999.99`).
pub const MAX_AMOUNT_CENTS: u64 = 999_999_999_999;

/// A non-negative amount in BRL, stored as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(u64);

impl Amount {
    /// Build from integer cents.
    pub fn from_cents(cents: u64) -> PixResult<Self> {
        if cents > MAX_AMOUNT_CENTS {
            return Err(PixError::InvalidAmount(format!("{} cents exceeds field limit", cents)));
        }
        Ok(Self(cents))
    }

    /// Build from a decimal value, rounding to the nearest cent.
    pub fn from_decimal(value: f64) -> PixResult<Self> {
        if !value.is_finite() {
            return Err(PixError::InvalidAmount(format!("{} is not a number", value)));
        }
        if value < 0.0 {
            return Err(PixError::InvalidAmount(format!("{} is negative", value)));
        }
        let cents = (value * 100.0).round();
        if cents > MAX_AMOUNT_CENTS as f64 {
            return Err(PixError::InvalidAmount(format!("{} exceeds field limit", value)));
        }
        Ok(Self(cents as u64))
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Decimal value, for JSON and display code.
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = PixError;

    /// Parse `"10"`, `"10.5"` or `"10.50"`. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PixError::InvalidAmount(format!("'{}' is not a decimal amount", s));

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty()
            || frac_part.len() > 2
            || !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let units: u64 = int_part.parse().map_err(|_| invalid())?;
        let fraction: u64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac_part.parse().map_err(|_| invalid())?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(invalid)?;
        Self::from_cents(cents)
    }
}

impl TryFrom<f64> for Amount {
    type Error = PixError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Amount::from_decimal(150.5).unwrap().to_string(), "150.50");
        assert_eq!(Amount::from_decimal(10.0).unwrap().to_string(), "10.00");
        assert_eq!(Amount::from_cents(7).unwrap().to_string(), "0.07");
    }

    #[test]
    fn test_decimal_rounding() {
        assert_eq!(Amount::from_decimal(0.1 + 0.2).unwrap().cents(), 30);
        assert_eq!(Amount::from_decimal(19.999).unwrap().cents(), 2000);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(matches!(Amount::from_decimal(-1.0), Err(PixError::InvalidAmount(_))));
        assert!(matches!(Amount::from_decimal(f64::NAN), Err(PixError::InvalidAmount(_))));
        assert!(matches!(Amount::from_decimal(f64::INFINITY), Err(PixError::InvalidAmount(_))));
    }

    #[test]
    fn test_parse() {
        assert_eq!("10".parse::<Amount>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Amount>().unwrap().cents(), 1050);
        assert_eq!("0.05".parse::<Amount>().unwrap().cents(), 5);
        assert!("-3".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!("1.234".parse::<Amount>().is_err());
        assert!(".5".parse::<Amount>().is_err());
        assert!("1,50".parse::<Amount>().is_err());
    }

    #[test]
    fn test_field_limit() {
        assert!(Amount::from_cents(MAX_AMOUNT_CENTS).is_ok());
        assert!(Amount::from_cents(MAX_AMOUNT_CENTS + 1).is_err());
        assert_eq!(Amount::from_cents(MAX_AMOUNT_CENTS).unwrap().to_string().len(), 13);
    }

    #[test]
    fn test_json_uses_numbers() {
        let amount: Amount = serde_json::from_str("25.9").unwrap();
        assert_eq!(amount.cents(), 2590);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "25.9");
        assert!(serde_json::from_str::<Amount>("-2").is_err());
    }
}
