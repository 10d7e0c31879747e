//! Currency amounts with two-digit cent precision.
//!
//! All arithmetic goes through `rust_decimal`, so values such as
//! `0.10 + 0.20` are exact.

use crate::error::{BillingError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

const CENT_SCALE: u32 = 2;

/// A currency amount, always held at scale 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Wrap a decimal, rounding half away from zero to whole cents.
    pub fn new(amount: Decimal) -> Self {
        let mut rounded = amount.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(CENT_SCALE);
        Money(rounded)
    }

    pub fn zero() -> Self {
        Money::new(Decimal::ZERO)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money::new(Decimal::new(cents, CENT_SCALE))
    }

    /// Parse user input such as `"45.50"`.
    ///
    /// Rejects anything with more than two fractional digits instead of
    /// silently rounding it.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let amount = Decimal::from_str(trimmed)
            .map_err(|_| BillingError::validation(format!("'{}' is not a valid amount", trimmed)))?;

        if amount.normalize().scale() > CENT_SCALE {
            return Err(BillingError::validation(format!(
                "'{}' has more than two decimal places",
                trimmed
            )));
        }

        Ok(Money::new(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn add(self, other: Money) -> Money {
        Money::new(self.0 + other.0)
    }

    /// Plain subtraction; may go negative. Callers clamp where the domain
    /// requires a non-negative result.
    pub fn subtract(self, other: Money) -> Money {
        Money::new(self.0 - other.0)
    }

    pub fn multiply(self, quantity: u32) -> Money {
        Money::new(self.0 * Decimal::from(quantity))
    }

    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> Money {
        amounts.into_iter().fold(Money::zero(), Money::add)
    }

    pub fn clamp_non_negative(self) -> Money {
        if self.is_negative() {
            Money::zero()
        } else {
            self
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Lossy conversion for metrics only.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::add(self, rhs)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        self.subtract(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money::sum(iter)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
