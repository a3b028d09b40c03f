use byteorder::{ByteOrder, LittleEndian};

use crate::common::types::Rid;

/// Fixed-width little-endian encoding for key and value types stored inside
/// bit-packed page layouts.
///
/// The bucket page derives its slot count from `ENCODED_SIZE`, so the width
/// must be the same for every instance of the type.
pub trait FixedCodec: Sized + Clone {
    const ENCODED_SIZE: usize;

    fn encode_into(&self, buf: &mut [u8]);
    fn decode_from(buf: &[u8]) -> Self;
}

impl FixedCodec for i32 {
    const ENCODED_SIZE: usize = 4;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_i32(buf, *self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        LittleEndian::read_i32(buf)
    }
}

impl FixedCodec for u32 {
    const ENCODED_SIZE: usize = 4;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(buf, *self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        LittleEndian::read_u32(buf)
    }
}

impl FixedCodec for i64 {
    const ENCODED_SIZE: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_i64(buf, *self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        LittleEndian::read_i64(buf)
    }
}

impl FixedCodec for u64 {
    const ENCODED_SIZE: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u64(buf, *self);
    }

    fn decode_from(buf: &[u8]) -> Self {
        LittleEndian::read_u64(buf)
    }
}

impl FixedCodec for Rid {
    const ENCODED_SIZE: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.page_id);
        LittleEndian::write_u32(&mut buf[4..8], self.slot);
    }

    fn decode_from(buf: &[u8]) -> Self {
        Self {
            page_id: LittleEndian::read_u32(&buf[0..4]),
            slot: LittleEndian::read_u32(&buf[4..8]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_round_trip() {
        let mut buf = [0u8; 8];

        (-12345i32).encode_into(&mut buf);
        assert_eq!(i32::decode_from(&buf), -12345);

        0xdead_beefu32.encode_into(&mut buf);
        assert_eq!(u32::decode_from(&buf), 0xdead_beef);

        u64::MAX.encode_into(&mut buf);
        assert_eq!(u64::decode_from(&buf), u64::MAX);
    }

    #[test]
    fn test_rid_round_trip() {
        let mut buf = [0u8; 8];
        let rid = Rid::new(42, 7);

        rid.encode_into(&mut buf);
        assert_eq!(Rid::decode_from(&buf), rid);
    }

    #[test]
    fn test_encoding_is_little_endian() {
        let mut buf = [0u8; 4];
        0x0102_0304u32.encode_into(&mut buf);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    }
}
