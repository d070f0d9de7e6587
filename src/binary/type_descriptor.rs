use std::io::Write;

use crate::binary::constants::v1_0::length_codes;
use crate::binary::var_uint::VarUInt;
use crate::result::IonResult;

// The largest possible 'L' (length) value that can be written directly in a type descriptor byte.
// Larger length values will need to be written as a VarUInt following the type descriptor.
pub(crate) const MAX_INLINE_LENGTH: usize = 13;

/// Writes a type descriptor to the provided `sink`: the given type code with `length`
/// packed into its low nibble if it fits, or the VarUInt length code followed by the
/// length itself otherwise. `type_code` carries the high nibble bit pattern of the value's
/// type (e.g. `0x20` for a positive int). Returns the number of bytes written.
pub(crate) fn write_type_descriptor<W: Write>(
    sink: &mut W,
    type_code: u8,
    length: usize,
) -> IonResult<usize> {
    if length <= MAX_INLINE_LENGTH {
        sink.write_all(&[type_code | length as u8])?;
        return Ok(1);
    }
    sink.write_all(&[type_code | length_codes::VAR_UINT])?;
    let length_bytes = VarUInt::write_u64(sink, length as u64)?;
    Ok(1 + length_bytes)
}

/// Returns the number of bytes that [write_type_descriptor] would need for a value of the
/// given length.
pub(crate) fn type_descriptor_size_of(length: usize) -> usize {
    if length <= MAX_INLINE_LENGTH {
        return 1;
    }
    1 + VarUInt::encoded_size_of(length as u64)
}
