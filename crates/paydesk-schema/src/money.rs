use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest magnitude accepted from text or config: one trillion dollars.
const MAX_CENTS: i64 = 100_000_000_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    #[error("invalid amount: {0}")]
    Invalid(#[from] std::num::ParseFloatError),
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount is out of range")]
    OutOfRange,
}

/// Dollar amount stored as whole cents.
///
/// Seeds and config files carry plain decimal numbers (`482.76`); they are
/// rounded to the nearest cent on the way in so ledger arithmetic stays exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Round `value` dollars to the nearest cent. Rejects NaN, infinities
    /// and anything beyond a trillion dollars either way.
    pub fn try_from_f64(value: f64) -> Result<Self, ParseMoneyError> {
        if !value.is_finite() {
            return Err(ParseMoneyError::NotFinite);
        }
        let cents = (value * 100.0).round();
        if cents.abs() > MAX_CENTS as f64 {
            return Err(ParseMoneyError::OutOfRange);
        }
        Ok(Self(cents as i64))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self - other`, floored at zero.
    pub fn floored_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// Divide into `parts` equal shares, rounding half away from zero to the cent.
    pub fn split(self, parts: u32) -> Money {
        let divisor = i64::from(parts.max(1));
        let quotient = self.0 / divisor;
        let remainder = self.0 % divisor;
        if remainder.abs() * 2 >= divisor {
            Money(quotient + self.0.signum())
        } else {
            Money(quotient)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$').replace(',', "");
        Money::try_from_f64(trimmed.parse::<f64>()?)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::try_from_f64(value).map_err(D::Error::custom)
    }
}
