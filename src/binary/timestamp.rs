use std::io::Write;

use arrayvec::ArrayVec;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::binary::type_descriptor::write_type_descriptor;
use crate::binary::uint::DecodedUInt;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::result::IonResult;

const MAX_TIMESTAMP_LENGTH: usize = 16;

// The exponent of a fractional-seconds coefficient expressed in nanoseconds.
const NANOSECONDS_EXPONENT: i64 = -9;

/// Provides support to write timestamps into [Ion binary].
///
/// [Ion binary]: https://amazon-ion.github.io/ion-docs/docs/binary.html#6-timestamp
pub trait TimestampBinaryEncoder {
    /// Encodes the content of a timestamp as per the Ion binary encoding.
    ///
    /// This does not encode the type descriptor nor the associated length.
    /// Prefer [`TimestampBinaryEncoder::encode_timestamp_value`] for that.
    fn encode_timestamp(&mut self, timestamp: &DateTime<FixedOffset>) -> IonResult<()>;

    /// Encodes a timestamp as an Ion value with the type descriptor and length.
    fn encode_timestamp_value(&mut self, timestamp: &DateTime<FixedOffset>) -> IonResult<()>;
}

impl<W> TimestampBinaryEncoder for W
where
    W: Write,
{
    /// NOTE: this function always encodes with second (or, when the subsecond field
    /// is populated, nanosecond) precision.
    fn encode_timestamp(&mut self, timestamp: &DateTime<FixedOffset>) -> IonResult<()> {
        const SECONDS_PER_MINUTE: i32 = 60;

        // Each component of the timestamp is in UTC time. Readers then apply the offset
        // minutes to derive the localized time.
        let utc = timestamp.with_timezone(&Utc);

        // Write out the offset (minutes difference from UTC).
        let offset_minutes = (timestamp.offset().local_minus_utc() / SECONDS_PER_MINUTE) as i64;
        VarInt::write_i64(self, offset_minutes)?;

        VarUInt::write_u64(self, utc.year() as u64)?;
        VarUInt::write_u64(self, utc.month() as u64)?;
        VarUInt::write_u64(self, utc.day() as u64)?;
        VarUInt::write_u64(self, utc.hour() as u64)?;
        VarUInt::write_u64(self, utc.minute() as u64)?;
        VarUInt::write_u64(self, utc.second() as u64)?;

        // A populated subsecond field is encoded as a fractional-seconds pair: the
        // exponent is a VarInt and the nanoseconds coefficient is a UInt magnitude.
        let nanoseconds = utc.nanosecond();
        if nanoseconds != 0 {
            VarInt::write_i64(self, NANOSECONDS_EXPONENT)?;
            DecodedUInt::write_u64(self, nanoseconds as u64)?;
        }

        Ok(())
    }

    fn encode_timestamp_value(&mut self, timestamp: &DateTime<FixedOffset>) -> IonResult<()> {
        // First encode the timestamp. We need to know the encoded length before
        // we can compute and write out the type descriptor.
        let mut encoded: ArrayVec<u8, MAX_TIMESTAMP_LENGTH> = ArrayVec::new();
        encoded.encode_timestamp(timestamp)?;

        write_type_descriptor(self, 0x60, encoded.len())?;

        // Now we can write out the encoded timestamp!
        self.write_all(&encoded[..])?;

        Ok(())
    }
}
