//! The byte-stream boundary of the dispatch engine.
//!
//! Strategies never touch a transport directly. They write through
//! [`PayloadWriter`] and read through [`PayloadReader`]: ordered primitive
//! operations over an opaque sequential byte encoding, with strict
//! producer/consumer symmetry and no random access.
//!
//! [`BufferWriter`] and [`BufferReader`] are the in-memory pair used by
//! `round_trip` and by tests; transports provide their own implementations.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::StreamFormatError;

// -----------------------------------------------------------------------------
// PayloadWriter

/// Ordered primitive-write operations over a sequential byte sink.
///
/// All multi-byte values are little-endian; strings and byte spans are
/// length-prefixed with a `u32`.
pub trait PayloadWriter {
    /// Appends raw bytes without a length prefix.
    fn write_raw(&mut self, bytes: &[u8]);

    fn write_u8(&mut self, v: u8) {
        self.write_raw(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    fn write_u16(&mut self, v: u16) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_u128(&mut self, v: u128) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_i8(&mut self, v: i8) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_i16(&mut self, v: i16) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_i128(&mut self, v: i128) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_raw(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_raw(&v.to_le_bytes());
    }

    /// Writes a `u32` length prefix followed by the UTF-8 bytes.
    fn write_str(&mut self, v: &str) {
        self.write_u32(v.len() as u32);
        self.write_raw(v.as_bytes());
    }

    /// Writes a `u32` length prefix followed by the raw bytes.
    fn write_bytes(&mut self, v: &[u8]) {
        self.write_u32(v.len() as u32);
        self.write_raw(v);
    }
}

// -----------------------------------------------------------------------------
// PayloadReader

/// Ordered primitive-read operations consuming bytes in the exact order
/// a [`PayloadWriter`] produced them.
pub trait PayloadReader {
    /// Consumes exactly `len` raw bytes.
    fn read_raw(&mut self, len: usize) -> Result<&[u8], StreamFormatError>;

    fn read_u8(&mut self) -> Result<u8, StreamFormatError> {
        Ok(self.read_raw(1)?[0])
    }

    fn read_bool(&mut self) -> Result<bool, StreamFormatError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            raw => Err(StreamFormatError::InvalidBool(raw)),
        }
    }

    fn read_u16(&mut self) -> Result<u16, StreamFormatError> {
        let bytes = self.read_raw(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, StreamFormatError> {
        let bytes = self.read_raw(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, StreamFormatError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_raw(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    fn read_u128(&mut self) -> Result<u128, StreamFormatError> {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(self.read_raw(16)?);
        Ok(u128::from_le_bytes(raw))
    }

    fn read_i8(&mut self) -> Result<i8, StreamFormatError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, StreamFormatError> {
        Ok(self.read_u16()? as i16)
    }

    fn read_i32(&mut self) -> Result<i32, StreamFormatError> {
        Ok(self.read_u32()? as i32)
    }

    fn read_i64(&mut self) -> Result<i64, StreamFormatError> {
        Ok(self.read_u64()? as i64)
    }

    fn read_i128(&mut self) -> Result<i128, StreamFormatError> {
        Ok(self.read_u128()? as i128)
    }

    fn read_f32(&mut self) -> Result<f32, StreamFormatError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_f64(&mut self) -> Result<f64, StreamFormatError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a `u32` length prefix followed by that many UTF-8 bytes.
    fn read_str(&mut self) -> Result<String, StreamFormatError> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_raw(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StreamFormatError::InvalidUtf8)
    }

    /// Reads a `u32` length prefix followed by that many raw bytes.
    fn read_bytes(&mut self) -> Result<Vec<u8>, StreamFormatError> {
        let len = self.read_u32()? as usize;
        Ok(self.read_raw(len)?.to_vec())
    }
}

// -----------------------------------------------------------------------------
// BufferWriter

/// A [`PayloadWriter`] over a growable in-memory byte buffer.
#[derive(Default, Debug, Clone)]
pub struct BufferWriter {
    bytes: Vec<u8>,
}

impl BufferWriter {
    /// Creates an empty writer.
    #[inline]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Returns the bytes written so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the writer and returns the produced buffer.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl PayloadWriter for BufferWriter {
    #[inline]
    fn write_raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

// -----------------------------------------------------------------------------
// BufferReader

/// A [`PayloadReader`] over an in-memory byte slice.
#[derive(Debug)]
pub struct BufferReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BufferReader<'a> {
    /// Creates a reader at the start of `bytes`.
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

impl PayloadReader for BufferReader<'_> {
    fn read_raw(&mut self, len: usize) -> Result<&[u8], StreamFormatError> {
        if self.remaining() < len {
            return Err(StreamFormatError::BufferUnderflow {
                required: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{BufferReader, BufferWriter, PayloadReader, PayloadWriter};
    use crate::error::StreamFormatError;

    #[test]
    fn write_read_in_order() {
        let mut writer = BufferWriter::new();
        writer.write_i32(-3);
        writer.write_str("Goodbye");
        writer.write_bool(true);
        writer.write_f64(0.5);

        let mut reader = BufferReader::new(writer.as_bytes());
        assert_eq!(reader.read_i32().unwrap(), -3);
        assert_eq!(reader.read_str().unwrap(), "Goodbye");
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_f64().unwrap(), 0.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn underflow_reports_sizes() {
        let mut reader = BufferReader::new(&[1, 2]);
        assert_eq!(
            reader.read_u32(),
            Err(StreamFormatError::BufferUnderflow {
                required: 4,
                remaining: 2,
            })
        );
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let mut reader = BufferReader::new(&[7]);
        assert_eq!(reader.read_bool(), Err(StreamFormatError::InvalidBool(7)));
    }
}
