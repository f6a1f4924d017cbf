//! Value Objects for the shop domain

mod address;

pub use address::{Address, AddressError, AddressInput};

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// Non-negative amount of money in the shop's single currency.
///
/// Serialized as a JSON number; arithmetic stays in `Decimal`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO { return Err(MoneyError::Negative(amount)); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }
    pub fn add(&self, other: Money) -> Money { Money(self.0 + other.0) }
    pub fn multiply(&self, qty: Quantity) -> Money { Money(self.0 * Decimal::from(qty.value())) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::ZERO, |acc, m| acc.add(m)) }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value: f64 = self.0.to_string().parse().map_err(serde::ser::Error::custom)?;
        serializer.serialize_f64(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
}

/// Item count on a cart or order line. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single line can hold; matches the storage column width.
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::BelowMinimum(value)); }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0).min(Self::MAX)) }
    /// `None` when nothing would be left.
    pub fn checked_sub(&self, other: Quantity) -> Option<Self> { self.0.checked_sub(other.0).filter(|v| *v >= 1).map(Self) }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1, got {0}")]
    BelowMinimum(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

impl QuantityError {
    pub fn value(&self) -> i64 {
        match self { Self::BelowMinimum(v) | Self::TooLarge(v) => *v }
    }
}
