//! Bounded byte cursor used by every container parser.
//!
//! All reads are checked against the end of the underlying slice and fail
//! with [`MetadataError::UnexpectedEof`] instead of panicking, so parsers can
//! use `?` and recover at block/frame granularity.

use crate::error::{MetadataError, Result};

/// Read-only cursor over a byte slice that owns its position.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the slice.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves the cursor to an absolute offset (may equal the slice length).
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(self.eof_error(pos.saturating_sub(self.pos)));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let end = match self.pos.checked_add(len) {
            Some(end) if end <= data.len() => end,
            _ => return Err(self.eof_error(len)),
        };
        let bytes = &data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Returns everything after the cursor and moves to the end.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        let rest = &data[self.pos.min(data.len())..];
        self.pos = data.len();
        rest
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u24_be(&mut self) -> Result<u32> {
        let [a, b, c] = self.read_array::<3>()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_synchsafe_u32(&mut self) -> Result<u32> {
        Ok(decode_synchsafe(self.read_u32_be()?))
    }

    /// Reads a 4-byte ASCII identifier (FLAC/ID3 frame id, MP4 atom type).
    pub fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        self.read_array()
    }

    /// Reads a `u32`-length-prefixed byte string.
    pub fn read_prefixed_le(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32_le()? as usize;
        self.read_bytes(len)
    }

    pub fn read_prefixed_be(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32_be()? as usize;
        self.read_bytes(len)
    }

    /// Reads up to (and consumes) a terminator of `width` zero bytes aligned
    /// to `width` relative to the cursor. Without a terminator the rest of
    /// the slice is returned.
    pub fn read_terminated(&mut self, width: usize) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        let rest = &data[self.pos.min(data.len())..];
        match find_terminator(rest, width) {
            Some(idx) => {
                self.pos += idx + width;
                &rest[..idx]
            }
            None => {
                self.pos = data.len();
                rest
            }
        }
    }

    fn eof_error(&self, needed: usize) -> MetadataError {
        MetadataError::UnexpectedEof {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }
}

/// Index of the first `width`-aligned run of `width` zero bytes.
pub fn find_terminator(data: &[u8], width: usize) -> Option<usize> {
    let width = width.max(1);
    data.chunks_exact(width)
        .position(|chunk| chunk.iter().all(|b| *b == 0))
        .map(|idx| idx * width)
}

/// Reassembles a 28-bit integer from four 7-bit groups (top bit of each
/// byte ignored).
pub fn decode_synchsafe(raw: u32) -> u32 {
    ((raw & 0x7F00_0000) >> 3)
        | ((raw & 0x007F_0000) >> 2)
        | ((raw & 0x0000_7F00) >> 1)
        | (raw & 0x0000_007F)
}

/// Spreads the low 28 bits of `value` over four bytes with the top bit clear.
pub fn encode_synchsafe(value: u32) -> u32 {
    let value = value & 0x0FFF_FFFF;
    ((value << 3) & 0x7F00_0000)
        | ((value << 2) & 0x007F_0000)
        | ((value << 1) & 0x0000_7F00)
        | (value & 0x0000_007F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_reads() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xAA, 0xBB, 0xCC];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32_be().unwrap(), 0x0102_0304);
        assert_eq!(reader.read_u32_le().unwrap(), 0x0807_0605);
        assert_eq!(reader.read_u24_be().unwrap(), 0x00AA_BBCC);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_past_end_is_error() {
        let data = [0x00u8, 0x01];
        let mut reader = ByteReader::new(&data);
        let err = reader.read_u32_be().unwrap_err();
        match err {
            MetadataError::UnexpectedEof {
                offset,
                needed,
                available,
            } => {
                assert_eq!(offset, 0);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Failed reads do not move the cursor
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_huge_length_does_not_overflow() {
        let data = [0xFFu8, 0xFF, 0xFF, 0xFF, 0x00];
        let mut reader = ByteReader::new(&data);
        assert!(reader.read_prefixed_le().is_err());
        let mut reader = ByteReader::new(&data);
        reader.skip(1).unwrap();
        assert!(reader.read_bytes(usize::MAX).is_err());
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut reader = ByteReader::new(&data);
        assert!(reader.seek(4).is_ok());
        assert!(reader.is_empty());
        assert!(reader.seek(5).is_err());
    }

    #[test]
    fn test_read_terminated_single_byte() {
        let data = b"image/png\0rest";
        let mut reader = ByteReader::new(data);
        assert_eq!(reader.read_terminated(1), b"image/png");
        assert_eq!(reader.read_rest(), b"rest");
    }

    #[test]
    fn test_read_terminated_utf16_is_aligned() {
        // 'A' = 0x41 0x00 in UTF-16LE; the 0x00 0x00 straddling units must not match
        let data = [0x41u8, 0x00, 0x00, 0x42, 0x00, 0x00, 0xFF];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_terminated(2), &[0x41u8, 0x00, 0x00, 0x42][..]);
        assert_eq!(reader.read_rest(), &[0xFFu8][..]);
    }

    #[test]
    fn test_read_terminated_without_terminator() {
        let data = b"abc";
        let mut reader = ByteReader::new(data);
        assert_eq!(reader.read_terminated(1), b"abc");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_synchsafe_known_values() {
        assert_eq!(decode_synchsafe(0x0000_0201), 257);
        assert_eq!(decode_synchsafe(0x7F7F_7F7F), 0x0FFF_FFFF);
        // Top bits are ignored
        assert_eq!(decode_synchsafe(0x8000_0080), 0);
        assert_eq!(encode_synchsafe(257), 0x0000_0201);
    }

    #[test]
    fn test_synchsafe_round_trip() {
        for value in [0u32, 1, 127, 128, 255, 16_383, 16_384, 1_000_000, 0x0FFF_FFFF] {
            let encoded = encode_synchsafe(value);
            assert_eq!(encoded & 0x8080_8080, 0, "top bits must be clear");
            assert_eq!(decode_synchsafe(encoded), value);
        }
        // Pseudo-random sweep across the 28-bit range
        let mut value: u32 = 12_345;
        for _ in 0..1_000 {
            value = value.wrapping_mul(1_103_515_245).wrapping_add(12_345) & 0x0FFF_FFFF;
            assert_eq!(decode_synchsafe(encode_synchsafe(value)), value);
        }
    }
}
