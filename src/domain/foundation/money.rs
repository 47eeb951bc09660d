//! Money and commission value objects.
//!
//! All amounts are integer minor units (paise, cents). No floats.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Basis points in one whole (100%).
const BPS_PER_WHOLE: i64 = 10_000;

/// Non-negative monetary amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units, rejecting negatives.
    pub fn from_minor(minor: i64) -> Result<Self, ValidationError> {
        if minor < 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("amount cannot be negative, got {}", minor),
            ));
        }
        Ok(Self(minor))
    }

    /// Zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts, saturating at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// ISO-4217 currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Creates a currency code, requiring exactly three ASCII letters.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("expected a three-letter ISO code, got '{}'", code),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform commission rate in basis points (500 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRate(u32);

impl CommissionRate {
    /// Creates a rate, rejecting anything above 100%.
    pub fn from_bps(bps: u32) -> Result<Self, ValidationError> {
        if i64::from(bps) > BPS_PER_WHOLE {
            return Err(ValidationError::out_of_range(
                "commission_rate_bps",
                0,
                BPS_PER_WHOLE as i32,
                bps as i32,
            ));
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Splits a total into `(commission, payout)`.
    ///
    /// Commission rounds half-up to the nearest minor unit; payout is the
    /// exact remainder so the two always sum to `total`.
    pub fn split(&self, total: Money) -> (Money, Money) {
        let raw = total.0 as i128 * i128::from(self.0);
        let whole = i128::from(BPS_PER_WHOLE);
        let commission = ((raw + whole / 2) / whole) as i64;
        let commission = Money(commission.min(total.0));
        (commission, total.saturating_sub(commission))
    }
}
