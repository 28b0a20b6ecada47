//! The bit-level read/write cursor every codec in this crate is built on.
//!
//! Bits are stored MSB-first within each byte, matching X.691 unaligned PER
//! directly: the first bit written occupies bit 7 of byte 0.

use bitvec::prelude::*;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::{PerError, Result};

type Store = BitVec<u8, Msb0>;

/// An auto-growing bit stream with a read/write cursor.
///
/// A buffer is either **allocated** (empty, writable, cursor at 0) or
/// **wraps** existing bytes for reading (cursor at 0, `bit_length` either
/// `bytes.len() * 8` or an explicit narrower length for sub-byte-precision
/// sources).
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    bits: Store,
    offset: usize,
}

impl BitBuffer {
    /// A new, empty, writable buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `bytes` for reading, with `bit_length` equal to `bytes.len() * 8`.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bits: BitVec::from_slice(bytes),
            offset: 0,
        }
    }

    /// Wraps `bytes` for reading with an explicit, possibly sub-byte,
    /// `bit_length`.
    pub fn from_bytes_with_bit_length(bytes: &[u8], bit_length: usize) -> Result<Self> {
        if bit_length > bytes.len() * 8 {
            return Err(PerError::invalid_argument(format!(
                "bit_length {bit_length} exceeds {} available bits",
                bytes.len() * 8
            )));
        }
        let mut bits = BitVec::from_slice(bytes);
        bits.truncate(bit_length);
        Ok(Self { bits, offset: 0 })
    }

    /// Parses a left-to-right write-order binary string (e.g. `"1011"`)
    /// into a buffer ready for reading.
    pub fn from_binary_string(text: &str) -> Result<Self> {
        let mut bits = Store::new();
        for ch in text.chars() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => {
                    return Err(PerError::invalid_argument(format!(
                        "invalid character {ch:?} in binary string"
                    )))
                }
            }
        }
        Ok(Self { bits, offset: 0 })
    }

    /// Current cursor position, in bits.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total number of valid bits currently stored.
    #[must_use]
    pub fn bit_length(&self) -> usize {
        self.bits.len()
    }

    /// Bits left to read from the cursor to the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bit_length().saturating_sub(self.offset)
    }

    /// Moves the cursor back to the start.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Moves the cursor to an arbitrary position.
    pub fn seek(&mut self, bit_offset: usize) -> Result<()> {
        if bit_offset > self.bit_length() {
            return Err(PerError::invalid_argument(format!(
                "cannot seek to bit {bit_offset}, buffer holds only {} bits",
                self.bit_length()
            )));
        }
        self.offset = bit_offset;
        Ok(())
    }

    fn require(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(PerError::BufferUnderflow {
                bit_offset: self.offset,
                needed: count - self.remaining(),
            });
        }
        Ok(())
    }

    /// Writes a single bit and advances the cursor.
    pub fn write_bit(&mut self, bit: bool) {
        if self.offset == self.bits.len() {
            self.bits.push(bit);
        } else {
            self.bits.set(self.offset, bit);
        }
        self.offset += 1;
    }

    /// Reads a single bit and advances the cursor.
    pub fn read_bit(&mut self) -> Result<bool> {
        self.require(1)?;
        let bit = self.bits[self.offset];
        self.offset += 1;
        Ok(bit)
    }

    /// Writes the low `count` bits of `value`, MSB-first. `count` must be
    /// in `0..=32`.
    pub fn write_bits(&mut self, value: u32, count: u32) -> Result<()> {
        if count > 32 {
            return Err(PerError::invalid_argument(format!(
                "write_bits count {count} exceeds 32"
            )));
        }
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Reads `count` bits (MSB-first) as an unsigned value. `count` must be
    /// in `0..=32`.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count > 32 {
            return Err(PerError::invalid_argument(format!(
                "read_bits count {count} exceeds 32"
            )));
        }
        self.require(count as usize)?;
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Writes `value` as `count` bits, MSB-first, for widths beyond 32 bits.
    /// `value` must be non-negative; the caller (the PER integer helpers)
    /// is responsible for the two's-complement/offset transform.
    pub fn write_wide_bits(&mut self, value: &BigUint, count: usize) -> Result<()> {
        // Reject silently-truncating values: every set bit above `count`
        // would otherwise just vanish.
        if value.bits() as usize > count {
            return Err(PerError::invalid_argument(format!(
                "value requires more than {count} bits"
            )));
        }
        let mut bits = vec![false; count];
        for (i, bit) in bits.iter_mut().rev().enumerate() {
            *bit = value.bit(i as u64);
        }
        for bit in bits {
            self.write_bit(bit);
        }
        Ok(())
    }

    /// Reads `count` bits, MSB-first, as an unsigned arbitrary-precision
    /// integer.
    pub fn read_wide_bits(&mut self, count: usize) -> Result<BigUint> {
        self.require(count)?;
        let mut value = BigUint::zero();
        for _ in 0..count {
            value <<= 1u32;
            if self.read_bit()? {
                value |= BigUint::from(1u8);
            }
        }
        Ok(value)
    }

    /// Writes a sequence of whole octets. Equivalent to, but faster than,
    /// calling `write_bits(byte, 8)` per byte — required because the
    /// cursor need not be byte-aligned.
    pub fn write_octets(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write_bits(u32::from(byte), 8)?;
        }
        Ok(())
    }

    /// Reads `byte_count` whole octets.
    pub fn read_octets(&mut self, byte_count: usize) -> Result<Vec<u8>> {
        self.require(byte_count * 8)?;
        let mut out = Vec::with_capacity(byte_count);
        for _ in 0..byte_count {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    /// The raw bit storage written so far, as a compact byte slice with the
    /// final byte zero-padded on the right.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bits = self.bits.clone();
        let pad = (8 - bits.len() % 8) % 8;
        bits.extend(core::iter::repeat(false).take(pad));
        bits.into_vec()
    }

    /// Hex-encodes [`Self::to_bytes`].
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_bytes().iter().map(|b| format!("{b:02X}")).collect()
    }

    /// The contents written so far as a left-to-right write-order string of
    /// `'0'`/`'1'` characters.
    #[must_use]
    pub fn to_binary_string(&self) -> String {
        self.bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
    }

    /// Returns the bits `[start_bit, start_bit + length_bits)` as a
    /// left-aligned, zero-padded byte slice, **without moving the cursor**.
    pub fn extract_bits(&self, start_bit: usize, length_bits: usize) -> Result<Vec<u8>> {
        if start_bit + length_bits > self.bit_length() {
            return Err(PerError::BufferUnderflow {
                bit_offset: start_bit,
                needed: start_bit + length_bits - self.bit_length(),
            });
        }
        let mut bits: Store = self.bits[start_bit..start_bit + length_bits].to_bitvec();
        let pad = (8 - bits.len() % 8) % 8;
        bits.extend(core::iter::repeat(false).take(pad));
        Ok(bits.into_vec())
    }

    /// Reads `length_bits` bits at the cursor, advancing it, returned the
    /// same left-aligned zero-padded way as [`Self::extract_bits`].
    pub fn read_raw_bits(&mut self, length_bits: usize) -> Result<Vec<u8>> {
        let start = self.offset;
        let bytes = self.extract_bits(start, length_bits)?;
        self.offset += length_bits;
        Ok(bytes)
    }

    /// The inverse of [`Self::extract_bits`]: writes `length_bits` bits from
    /// the left-aligned `bytes` at the current cursor.
    pub fn write_raw_bits(&mut self, bytes: &[u8], length_bits: usize) -> Result<()> {
        if length_bits > bytes.len() * 8 {
            return Err(PerError::invalid_argument(format!(
                "length_bits {length_bits} exceeds {} available bits",
                bytes.len() * 8
            )));
        }
        let source: Store = BitVec::from_slice(bytes);
        for bit in &source[..length_bits] {
            self.write_bit(*bit);
        }
        Ok(())
    }
}

/// Converts a non-negative [`BigInt`] into a minimum-length big-endian
/// unsigned byte sequence, with a single `0x00` byte standing in for zero.
#[must_use]
pub fn minimal_unsigned_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        return vec![0];
    }
    value.to_bytes_be()
}

/// Converts a (possibly negative) [`BigInt`] into a minimum-length
/// two's-complement big-endian byte sequence, per X.691's unconstrained
/// whole-number encoding: positive values gain a leading `0x00` iff the top
/// bit would otherwise read as set; negative values trim redundant `0xFF`
/// bytes; zero is a single `0x00` byte.
#[must_use]
pub fn minimal_twos_complement_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return vec![0];
    }
    match value.sign() {
        Sign::Plus => {
            let mut bytes = value.to_biguint().expect("positive").to_bytes_be();
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0);
            }
            bytes
        }
        Sign::Minus => {
            let mut bytes = value.to_signed_bytes_be();
            while bytes.len() > 1 && bytes[0] == 0xFF && bytes[1] & 0x80 != 0 {
                bytes.remove(0);
            }
            bytes
        }
        Sign::NoSign => vec![0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_round_trip_bits() {
        let mut buf = BitBuffer::new();
        buf.write_bit(true);
        buf.write_bits(0b1011, 4).unwrap();
        buf.write_bit(false);
        let bytes = buf.to_bytes();
        let mut reader = BitBuffer::from_bytes(&bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert!(!reader.read_bit().unwrap());
    }

    #[test]
    fn msb_first_byte_layout() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b1010_0000, 8).unwrap();
        assert_eq!(buf.to_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn extract_bits_does_not_move_cursor() {
        let bytes = [0xFFu8, 0x00];
        let buf = BitBuffer::from_bytes(&bytes);
        let extracted = buf.extract_bits(4, 8).unwrap();
        assert_eq!(extracted, vec![0b1111_0000]);
        assert_eq!(buf.offset(), 0);
    }

    #[test]
    fn write_raw_bits_inverts_extract_bits() {
        let bytes = [0b1100_1010u8, 0b1111_0000];
        let buf = BitBuffer::from_bytes(&bytes);
        let extracted = buf.extract_bits(2, 10).unwrap();

        let mut out = BitBuffer::new();
        out.write_raw_bits(&extracted, 10).unwrap();
        assert_eq!(out.bit_length(), 10);
        let mut reader = BitBuffer::from_bytes(&out.to_bytes());
        let mut verify = BitBuffer::from_bytes(&bytes);
        verify.seek(2).unwrap();
        for _ in 0..10 {
            assert_eq!(reader.read_bit().unwrap(), verify.read_bit().unwrap());
        }
    }

    #[test]
    fn underflow_on_short_read() {
        let mut buf = BitBuffer::from_bytes(&[0xFF]);
        buf.read_bits(8).unwrap();
        assert!(matches!(
            buf.read_bit(),
            Err(PerError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn seek_out_of_range_fails() {
        let mut buf = BitBuffer::from_bytes(&[0xFF]);
        assert!(buf.seek(9).is_err());
        assert!(buf.seek(8).is_ok());
    }

    #[test]
    fn binary_string_round_trip() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b1011, 4).unwrap();
        assert_eq!(&buf.to_binary_string(), "1011");
        let parsed = BitBuffer::from_binary_string("1011").unwrap();
        assert_eq!(parsed.to_binary_string(), buf.to_binary_string());
    }

    #[test]
    fn minimal_twos_complement_encodes_boundary_values() {
        assert_eq!(minimal_twos_complement_bytes(&BigInt::from(0)), vec![0]);
        assert_eq!(minimal_twos_complement_bytes(&BigInt::from(127)), vec![127]);
        assert_eq!(
            minimal_twos_complement_bytes(&BigInt::from(128)),
            vec![0, 128]
        );
        assert_eq!(minimal_twos_complement_bytes(&BigInt::from(-1)), vec![0xFF]);
        assert_eq!(
            minimal_twos_complement_bytes(&BigInt::from(-128)),
            vec![0x80]
        );
        assert_eq!(
            minimal_twos_complement_bytes(&BigInt::from(-129)),
            vec![0xFF, 0x7F]
        );
    }
}
