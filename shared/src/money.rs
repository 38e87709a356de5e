//! Money arithmetic using rust_decimal for precision
//!
//! All monetary values are carried as `Decimal` end-to-end; there are no
//! float conversions anywhere in the pipeline. Rounding happens only at
//! materialization points (line totals, discount values) and is always
//! half-up at 2 decimal places.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// A monetary amount with a fixed scale of 2
///
/// Construction rounds half-up to 2 decimal places, so every `Money`
/// value is already materialized; intermediate math that needs more
/// precision works on `Decimal` and converts back at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create from a decimal value, rounding half-up to 2 decimal places
    pub fn new(value: Decimal) -> Self {
        Money(round_money(value))
    }

    /// Create from an integer number of minor units (cents)
    pub fn from_minor(cents: i64) -> Self {
        Money(Decimal::new(cents, DECIMAL_PLACES))
    }

    /// The underlying decimal value
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiply by an integer quantity (line total materialization)
    pub fn times(self, quantity: u32) -> Money {
        Money::new(self.0 * Decimal::from(quantity))
    }

    /// Take a percentage of this amount, where `percent` is whole
    /// percentage points (10 means 10%), rounded half-up at 2 decimals
    pub fn percent(self, percent: Decimal) -> Money {
        Money::new(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Subtract, clamping the result at zero
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(Decimal::ZERO))
    }
}

/// Round a decimal to monetary scale (half-up, 2 decimal places)
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money::new(Decimal::from_str(s)?))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
