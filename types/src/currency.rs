// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Base units per whole coin. Mirrors the precision used by the reference
/// blockchain (`SiacoinPrecision`): amounts are always carried in base units
/// so that financial accounting never touches floating point.
pub const PRECISION: u128 = 1_000_000_000_000_000_000_000_000;

/// A precise, non-negative accounting value denominated in base units of the
/// host currency. All obligation bookkeeping (locked collateral, potential
/// and actual revenue, contract costs) uses this type rather than a native
/// float so that `Σ valid + Σ missed == payout` invariants hold exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(u128);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("currency arithmetic overflowed")]
    Overflow,
    #[error("currency arithmetic underflowed below zero")]
    Underflow,
}

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub fn from_base_units(units: u128) -> Self {
        Currency(units)
    }

    /// Constructs a value from a whole-coin count, scaled by [`PRECISION`].
    pub fn from_coins(coins: u64) -> Self {
        Currency(u128::from(coins) * PRECISION)
    }

    pub fn as_base_units(self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_add(other.0)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    pub fn checked_sub(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_sub(other.0)
            .map(Currency)
            .ok_or(CurrencyError::Underflow)
    }

    pub fn saturating_sub(self, other: Currency) -> Currency {
        Currency(self.0.saturating_sub(other.0))
    }

    pub fn checked_mul(self, factor: u128) -> Result<Currency, CurrencyError> {
        self.0
            .checked_mul(factor)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    /// `self * numerator / denominator`, rounding down. Used for collateral
    /// fraction and fee-estimate computations which are expressed as ratios
    /// over a million (parts-per-million) rather than floats.
    pub fn mul_div(self, numerator: u128, denominator: u128) -> Result<Currency, CurrencyError> {
        let scaled = self
            .0
            .checked_mul(numerator)
            .ok_or(CurrencyError::Overflow)?;
        Ok(Currency(scaled / denominator))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / PRECISION;
        let frac = self.0 % PRECISION;
        if frac == 0 {
            write!(f, "{whole} SC")
        } else {
            write!(f, "{whole}.{frac:024} SC")
        }
    }
}

impl Add for Currency {
    type Output = Currency;
    fn add(self, rhs: Currency) -> Currency {
        Currency(self.0 + rhs.0)
    }
}

impl Sub for Currency {
    type Output = Currency;
    fn sub(self, rhs: Currency) -> Currency {
        Currency(self.0 - rhs.0)
    }
}

impl Sum for Currency {
    fn sum<I: Iterator<Item = Currency>>(iter: I) -> Currency {
        iter.fold(Currency::ZERO, |acc, c| acc + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_rejects_negative_results() {
        assert_eq!(
            Currency::from_coins(1).checked_sub(Currency::from_coins(2)),
            Err(CurrencyError::Underflow)
        );
    }

    #[test]
    fn mul_div_computes_collateral_fraction() {
        // min(max_collateral, payout * fraction / (fraction + 1e6))
        let payout = Currency::from_coins(100);
        let fraction = 2_000_000u128; // 2x collateral per the reference ratio
        let got = payout.mul_div(fraction, fraction + 1_000_000).unwrap();
        // 100 * 2_000_000 / 3_000_000 = 66.666...
        assert_eq!(got.as_base_units(), payout.as_base_units() * 2 / 3);
    }

    #[test]
    fn display_renders_whole_coins_without_fraction() {
        assert_eq!(Currency::from_coins(5).to_string(), "5 SC");
    }
}
