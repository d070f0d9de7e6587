use num_bigint::BigInt;
use num_traits::Zero;

/// An arbitrary-precision decimal value: a signed integer coefficient scaled by
/// a power of ten. `Decimal::new(17, -1)` represents `1.7`, while
/// `Decimal::new(17, 2)` represents `1700`.
///
/// Note that `BigInt` cannot represent a negative zero coefficient; a decimal
/// created from `-0` is indistinguishable from one created from `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    coefficient: BigInt,
    exponent: i64,
}

impl Decimal {
    pub fn new<I: Into<BigInt>>(coefficient: I, exponent: i64) -> Decimal {
        Decimal {
            coefficient: coefficient.into(),
            exponent,
        }
    }

    /// Returns the unscaled integer component of this decimal.
    pub fn coefficient(&self) -> &BigInt {
        &self.coefficient
    }

    /// Returns the power of ten by which the coefficient is scaled.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Returns true if this decimal's coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.coefficient.is_zero()
    }
}

// This macro makes it possible to turn integers into a Decimal using `.into()`.
macro_rules! impl_decimal_from_integer_types {
    ($($t:ty),*) => ($(
        impl From<$t> for Decimal {
            fn from(coefficient: $t) -> Decimal {
                Decimal::new(coefficient, 0)
            }
        }
    )*)
}
impl_decimal_from_integer_types!(i8, i16, i32, i64, u8, u16, u32, u64, BigInt);

#[cfg(test)]
mod decimal_tests {
    use super::*;

    #[test]
    fn test_zero_detection() {
        assert!(Decimal::new(0, 0).is_zero());
        assert!(Decimal::new(0, 6).is_zero());
        assert!(!Decimal::new(1, 0).is_zero());
    }

    #[test]
    fn test_from_integer() {
        let decimal: Decimal = 42.into();
        assert_eq!(decimal, Decimal::new(42, 0));
    }
}
