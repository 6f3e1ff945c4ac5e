//! Whole-number quantity value object.
//!
//! Stock and BOM quantities are integers by decree: the storage schema
//! declares every quantity column as a whole number, and any fractional
//! input is rejected up front with a validation error instead of being
//! rounded or truncated.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-negative whole-number quantity of stock-keeping units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Number", into = "Number")]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Quantity> {
        self.0.checked_mul(factor).map(Quantity)
    }

    /// Parse a possibly-fractional numeric input.
    ///
    /// Rejects negative, non-finite, and non-integral values with
    /// `DomainError::Validation` before any ledger access.
    pub fn try_from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation(format!(
                "quantity must be finite, got {value}"
            )));
        }
        if value < 0.0 {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative, got {value}"
            )));
        }
        if value.fract() != 0.0 {
            return Err(DomainError::validation(format!(
                "quantity must be a whole number, got {value}"
            )));
        }
        if value > u64::MAX as f64 {
            return Err(DomainError::validation(format!(
                "quantity out of range: {value}"
            )));
        }
        Ok(Self(value as u64))
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value).map(Quantity).map_err(|_| {
            DomainError::validation(format!("quantity cannot be negative, got {value}"))
        })
    }
}

impl TryFrom<Number> for Quantity {
    type Error = DomainError;

    fn try_from(value: Number) -> Result<Self, Self::Error> {
        if let Some(units) = value.as_u64() {
            return Ok(Self(units));
        }
        if value.as_i64().is_some() {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative, got {value}"
            )));
        }
        // Not representable as an integer: a fractional JSON number.
        Err(DomainError::validation(format!(
            "quantity must be a whole number, got {value}"
        )))
    }
}

impl From<Quantity> for Number {
    fn from(value: Quantity) -> Self {
        Number::from(value.0)
    }
}

impl ValueObject for Quantity {}
