//! Amount type for handling monetary values as they appear in close workbooks.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles
//! parsing cell text that may include dollar signs, a `USD` token, thousands
//! separators, parenthetical negatives, or a lone dash standing in for zero.

use format_num::format_num;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// Represents a dollar amount.
///
/// This type wraps `Decimal` and is constructed leniently from raw cell text
/// with [`Amount::clean`]: anything that cannot be read as a number becomes
/// zero rather than an error, because source workbooks routinely contain
/// dashes, blanks and stray text in numeric columns.
///
/// # Examples
///
/// ```
/// # use equity_close::model::Amount;
/// assert_eq!(Amount::clean("$1,234.50").to_string(), "$1,234.50");
/// assert_eq!(Amount::clean("(500)").value().to_string(), "-500");
/// assert_eq!(Amount::clean("-").value().to_string(), "0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses raw cell text into an `Amount`, coercing anything unparseable to
    /// zero. Rules, applied in order:
    ///
    /// 1. trim whitespace;
    /// 2. negativity comes from a leading minus sign or surrounding parens;
    /// 3. strip `$`, the literal `USD` token and thousands-separator commas;
    /// 4. an isolated dash token means zero;
    /// 5. parse what remains, apply the negativity flag.
    pub fn clean(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Amount::ZERO;
        }

        let negative =
            trimmed.starts_with('-') || (trimmed.contains('(') && trimmed.contains(')'));

        let stripped = trimmed
            .replace('$', "")
            .replace("USD", "")
            .replace(',', "")
            .replace(['(', ')'], "");
        let stripped = stripped.trim().trim_start_matches('-').trim();

        // A lone dash is an accountant's zero.
        if stripped.is_empty() || stripped == "-" {
            return Amount::ZERO;
        }

        match Decimal::from_str(stripped) {
            Ok(value) if negative => Amount(-value),
            Ok(value) => Amount(value),
            Err(_) => Amount::ZERO,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Rounds to two decimal places, the precision of a posted line.
    pub fn round_cents(&self) -> Self {
        Amount(self.0.round_dp(2))
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Self {
        Amount(self.0.abs())
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        write!(
            f,
            "{sign}${}",
            format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Payload files carry amounts as plain JSON numbers.
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Ok(Amount(
            Decimal::try_from(value).map_err(serde::de::Error::custom)?,
        ))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
