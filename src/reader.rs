//! Bounds-checked, unaligned-safe little-endian reads over a byte slice.
//!
//! Every multi-byte field in the wire format is read by copying into a
//! typed local rather than casting a pointer — the format makes no
//! alignment guarantee — and every read re-checks the remaining length
//! before touching the buffer, since the buffer is untrusted input.

use crate::error::{Error, Result};

/// A cursor over an in-memory buffer shared by the C2/C4/C5/C6/C7 parsers.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::decode(format!(
                "buffer underrun: need {n} bytes at offset {}, only {} remain",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Reads a variable-width unsigned integer whose width is selected by
    /// a 2-bit size hint (0 -> u8, 1 -> u16, 2 -> u32), widened to `u64`.
    /// Used repeatedly by the property header parser (C6).
    pub fn read_sized_uint(&mut self, size_hint: SizeHint) -> Result<u64> {
        Ok(match size_hint {
            SizeHint::U8 => self.read_u8()? as u64,
            SizeHint::U16 => self.read_u16()? as u64,
            SizeHint::U32 => self.read_u32()? as u64,
        })
    }
}

/// The 2-bit width code for a [`Reader::read_sized_uint`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeHint {
    U8,
    U16,
    U32,
}

impl SizeHint {
    /// Recovers a hint from its 2-bit wire encoding (0 -> u8, 1 -> u16,
    /// 2 -> u32). 3 is not assigned by the format; a corrupt info word
    /// carrying it is a fatal decode error, not a silent fallback to u32.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            0 => Ok(SizeHint::U8),
            1 => Ok(SizeHint::U16),
            2 => Ok(SizeHint::U32),
            _ => Err(Error::decode(format!("invalid size hint bits {bits}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_order() {
        let buf = [0x01, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16().unwrap(), 0x0002);
        assert_eq!(r.read_u32().unwrap(), 0x0003);
        assert!(r.at_end());
    }

    #[test]
    fn underrun_is_a_decode_error() {
        let buf = [0x01];
        let mut r = Reader::new(&buf);
        let err = r.read_u32().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn from_bits_rejects_the_unassigned_hint_value() {
        assert_eq!(SizeHint::from_bits(0).unwrap(), SizeHint::U8);
        assert_eq!(SizeHint::from_bits(1).unwrap(), SizeHint::U16);
        assert_eq!(SizeHint::from_bits(2).unwrap(), SizeHint::U32);
        assert!(matches!(SizeHint::from_bits(3), Err(Error::Decode(_))));
    }

    #[test]
    fn sized_uint_picks_width_by_hint() {
        let buf = [0xAB, 0x01, 0x02];
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_sized_uint(SizeHint::U8).unwrap(), 0xAB);
        assert_eq!(r.read_sized_uint(SizeHint::U16).unwrap(), 0x0201);
    }
}
