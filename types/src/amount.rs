//! Capacity and weight amounts.
//!
//! On-chain capacities are integers in shannons (u128) to avoid floating-point errors.
//! Vote weight is expressed in whole CKB: shannons divided by [`SHANNONS_PER_CKB`]
//! and floored.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Fixed scale factor between shannons and CKB (1 CKB = 10^8 shannons).
pub const SHANNONS_PER_CKB: u128 = 100_000_000;

/// A cell capacity in shannons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shannons(u128);

impl Shannons {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Whole CKB, floored. Saturates at `u64::MAX`.
    pub fn to_ckb_floor(&self) -> u64 {
        u64::try_from(self.0 / SHANNONS_PER_CKB).unwrap_or(u64::MAX)
    }

    /// Parse a capacity as reported by the explorer.
    ///
    /// Accepts a plain integer (`"10000000000"`) or a decimal whose fractional
    /// part is all zeros (`"10000000000.0"`). Shannons are indivisible, so a
    /// non-zero fraction is rejected.
    pub fn parse_decimal(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypesError::InvalidCapacity(s.to_string()));
        }
        if !frac_part.bytes().all(|b| b == b'0') {
            return Err(TypesError::InvalidCapacity(s.to_string()));
        }
        int_part
            .parse::<u128>()
            .map(Self)
            .map_err(|_| TypesError::InvalidCapacity(s.to_string()))
    }
}

impl Add for Shannons {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Shannons {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Shannons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shannons", self.0)
    }
}

/// A vote weight claimed by the forum, as a decimal number.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportedWeight(f64);

impl ReportedWeight {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Truncate toward negative infinity for integer comparison.
    ///
    /// NaN floors to 0; infinities saturate.
    pub fn floored(&self) -> i128 {
        self.0.floor() as i128
    }
}

impl fmt::Display for ReportedWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
