//! Bounded byte-level reader.
//!
//! Wraps an immutable byte slice with a cursor. Every read checks bounds
//! and fails with [`DwgError::Truncated`] when the requested range exceeds
//! the slice.

use crate::error::{DwgError, Result};

/// A cursor over an immutable byte slice with little-endian typed reads.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader over the full slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn tell(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(DwgError::Truncated { offset: pos as u64 });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip `count` bytes forward.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.seek(self.pos + count)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .ok_or(DwgError::Truncated { offset: u64::MAX })?;
        if end > self.data.len() {
            return Err(DwgError::Truncated {
                offset: self.pos as u64,
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Borrow `count` bytes at the cursor, advancing past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reads() {
        let data = [0x01u8, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0x12345678);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_read() {
        let mut r = ByteReader::new(&[0x01, 0x02]);
        let err = r.read_u32_le().unwrap_err();
        assert!(matches!(err, DwgError::Truncated { offset: 0 }));
    }

    #[test]
    fn test_seek_and_skip() {
        let data = [0u8, 1, 2, 3, 4, 5];
        let mut r = ByteReader::new(&data);
        r.seek(4).unwrap();
        assert_eq!(r.read_u8().unwrap(), 4);
        r.seek(0).unwrap();
        r.skip(2).unwrap();
        assert_eq!(r.read_u8().unwrap(), 2);
        assert!(r.seek(7).is_err());
    }

    #[test]
    fn test_read_f64() {
        let bytes = 2.5f64.to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f64_le().unwrap(), 2.5);
    }
}
