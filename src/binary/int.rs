use std::io::Write;
use std::mem;

use num_bigint::{BigInt, Sign};

use crate::result::IonResult;

/// Provides support for encoding fixed-length signed integers. The first bit of the
/// encoding is a sign bit rather than a two's complement representation. See the
/// [UInt and Int Fields](https://amazon-ion.github.io/ion-docs/docs/binary.html#uint-and-int-fields)
/// section of the binary Ion spec for more details.
#[derive(Debug)]
pub struct DecodedInt;

impl DecodedInt {
    /// Encodes the provided `value` as an Int and writes it to the provided `sink`.
    /// Returns the number of bytes written.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        let magnitude = value.unsigned_abs();
        // The encoding must leave room for a sign bit ahead of the magnitude's highest
        // set bit, so a whole extra byte is needed when the magnitude fills its leading
        // byte. An i64::MIN magnitude occupies all nine.
        let mut bytes = [0u8; mem::size_of::<u64>() + 1];
        bytes[1..].copy_from_slice(&magnitude.to_be_bytes());

        let occupied_bits = 64 - magnitude.leading_zeros() as usize;
        let encoded_length = (occupied_bits / 8) + 1;

        let start = bytes.len() - encoded_length;
        let bytes_to_write: &mut [u8] = &mut bytes[start..];
        if value < 0 {
            bytes_to_write[0] |= 0b1000_0000;
        }

        sink.write_all(bytes_to_write)?;
        Ok(bytes_to_write.len())
    }

    /// Encodes the provided `value` in sign-and-magnitude form and writes it to the
    /// provided `sink`. A zero-valued BigInt contributes no bytes to the output.
    /// Returns the number of bytes written.
    pub fn write_big_int<W: Write>(sink: &mut W, value: &BigInt) -> IonResult<usize> {
        let (sign, mut magnitude_bytes) = value.to_bytes_be();
        if value.bits() == 0 {
            return Ok(0);
        }

        let first_byte = &mut magnitude_bytes[0];
        let first_bit_is_zero: bool = *first_byte & 0b1000_0000 == 0;
        let mut extra_sign_byte: &[u8] = &[];
        if let Sign::Minus = sign {
            if first_bit_is_zero {
                // If the first bit is unset, it's now the sign bit. Set it to 1.
                *first_byte |= 0b1000_0000;
            } else {
                // Otherwise, write out an extra leading byte with its sign bit set.
                extra_sign_byte = &[0b1000_0000];
            }
        } else if !first_bit_is_zero {
            // A set first bit would read back as a minus sign; prepend a zero byte.
            extra_sign_byte = &[0b0000_0000];
        }

        sink.write_all(extra_sign_byte)?;
        sink.write_all(magnitude_bytes.as_slice())?;
        Ok(extra_sign_byte.len() + magnitude_bytes.len())
    }
}
