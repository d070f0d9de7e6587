use std::io::Write;

use num_traits::ToPrimitive;

use crate::binary::int::DecodedInt;
use crate::binary::type_descriptor::write_type_descriptor;
use crate::binary::var_int::VarInt;
use crate::result::IonResult;
use crate::types::decimal::Decimal;

// Large enough for the common case of a decimal converted from an f64.
const DECIMAL_BUFFER_SIZE: usize = 16;

/// Provides support to write [`Decimal`] into [Ion binary].
///
/// [Ion binary]: https://amazon-ion.github.io/ion-docs/docs/binary.html#5-decimal
pub trait DecimalBinaryEncoder {
    /// Encodes the content of a [`Decimal`] as per the Ion binary encoding.
    ///
    /// This does not encode the type descriptor nor the associated length.
    /// Prefer [`DecimalBinaryEncoder::encode_decimal_value`] for that.
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<()>;

    /// Encodes a [`Decimal`] as an Ion value with the type descriptor and
    /// length.
    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<()>;
}

impl<W> DecimalBinaryEncoder for W
where
    W: Write,
{
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<()> {
        // From the spec: "The exponent subfield should not be present (that is, it has
        // zero length) when the exponent's value is zero", and likewise for a
        // coefficient whose value is zero. A decimal zero with exponent zero therefore
        // has an empty encoding.
        if decimal.exponent() != 0 {
            VarInt::write_i64(self, decimal.exponent())?;
        }

        if decimal.is_zero() {
            return Ok(());
        }

        // If the coefficient is small enough to safely fit in an i64, use that to avoid
        // allocating.
        if let Some(small_coefficient) = decimal.coefficient().to_i64() {
            let _ = DecodedInt::write_i64(self, small_coefficient)?;
        } else {
            let _ = DecodedInt::write_big_int(self, decimal.coefficient())?;
        }

        Ok(())
    }

    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<()> {
        // First encode the decimal. We need to know the encoded length before
        // we can compute and write out the type descriptor.
        let mut encoded: Vec<u8> = Vec::with_capacity(DECIMAL_BUFFER_SIZE);
        encoded.encode_decimal(decimal)?;

        write_type_descriptor(self, 0x50, encoded.len())?;

        // Now we can write out the encoded decimal!
        self.write_all(&encoded[..])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use rstest::*;

    #[rstest]
    #[case::zero(Decimal::new(0, 0), &[0x50])]
    #[case::zero_with_exponent(Decimal::new(0, 3), &[0x51, 0x83])]
    #[case::integer_coefficient(Decimal::new(7, 0), &[0x51, 0x07])]
    #[case::one_point_seven(Decimal::new(17, -1), &[0x52, 0xC1, 0x11])]
    #[case::negative_one_point_seven(Decimal::new(-17, -1), &[0x52, 0xC1, 0x91])]
    #[case::large_exponent(Decimal::new(1, 100), &[0x53, 0x00, 0xE4, 0x01])]
    fn test_encode_decimal_value(#[case] decimal: Decimal, #[case] expected_bytes: &[u8]) {
        let mut buffer: Vec<u8> = vec![];
        buffer
            .encode_decimal_value(&decimal)
            .expect("Failed to encode the decimal.");
        assert_eq!(buffer.as_slice(), expected_bytes);
    }

    #[test]
    fn test_encode_decimal_with_huge_coefficient() {
        // A coefficient too large for the i64 fast path.
        let coefficient = BigInt::parse_bytes(b"123456789123456789123456789", 10).unwrap();
        let mut buffer: Vec<u8> = vec![];
        buffer
            .encode_decimal_value(&Decimal::new(coefficient, 0))
            .expect("Failed to encode the decimal.");
        // An 11-byte magnitude whose first bit doubles as the sign bit.
        assert_eq!(buffer[0], 0x5B);
        assert_eq!(buffer.len(), 12);
    }
}
