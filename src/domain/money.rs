use std::fmt;
use std::ops::{Add, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AppError;

const PLACES: u32 = 2;

/// Fixed-precision money amount. Always non-negative, always rounded to
/// two fractional digits after every arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn new(value: Decimal) -> Result<Self, AppError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AppError::invalid(format!(
                "amount cannot be negative, got: {value}"
            )));
        }
        Ok(Self(value.round_dp(PLACES)))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0
            .checked_add(other.0)
            .map(|v| v.round_dp(PLACES))
            .map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0
            .checked_sub(other.0)
            .filter(|v| !v.is_sign_negative() || v.is_zero())
            .map(|v| v.round_dp(PLACES))
            .map(Amount)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        self.checked_add(rhs).expect("Amount overflow")
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        self.checked_sub(rhs).expect("Amount underflow")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn rejects_negative() {
        assert!(Amount::new(d(-100)).is_err());
    }

    #[test]
    fn rounds_to_two_places() {
        let a = Amount::new(Decimal::new(1005, 3)).unwrap();
        assert_eq!(a.as_decimal(), d(101));
    }

    #[test]
    fn checked_sub_rejects_negative_result() {
        let a = Amount::new(d(100)).unwrap();
        let b = Amount::new(d(200)).unwrap();
        assert!(a.checked_sub(b).is_none());
    }

    #[test]
    fn add_sub_roundtrip() {
        let a = Amount::new(d(1050)).unwrap();
        let b = Amount::new(d(325)).unwrap();
        assert_eq!((a + b).as_decimal(), d(1375));
        assert_eq!((a - b).as_decimal(), d(725));
    }
}
