use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of micro-units in one whole unit of any currency.
pub const UNITS_SCALE: i64 = 1_000_000;

//--------------------------------------     MicroUnits       --------------------------------------------------------
/// A price or payment amount, expressed in millionths of the listing currency.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MicroUnits(i64);

op!(binary MicroUnits, Add, add);
op!(binary MicroUnits, Sub, sub);
op!(inplace MicroUnits, SubAssign, sub_assign);
op!(unary MicroUnits, Neg, neg);

impl Mul<i64> for MicroUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MicroUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in micro-units: {0}")]
pub struct MicroUnitsConversionError(String);

impl From<i64> for MicroUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MicroUnits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MicroUnits {}

impl TryFrom<u64> for MicroUnits {
    type Error = MicroUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MicroUnitsConversionError(format!("Value {value} is too large to convert to MicroUnits")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MicroUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / UNITS_SCALE as u64;
        let cents = (abs % UNITS_SCALE as u64) / 10_000;
        write!(f, "{sign}{whole}.{cents:02}")
    }
}

impl MicroUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * UNITS_SCALE)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
