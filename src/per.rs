//! PER (Packed Encoding Rules, unaligned) primitive encodings: constrained,
//! semi-constrained and unconstrained whole numbers, length determinants,
//! and normally-small numbers (X.691 §10).
//!
//! These are free functions over a [`BitBuffer`](crate::bits::BitBuffer)
//! rather than methods on a per-type encoder, the way `rasn::per::enc`'s
//! `Encoder` implements them: this crate has no monomorphized per-type
//! encoder, so the helpers take the buffer and the constraint parameters
//! directly.

use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive, Zero};

use crate::bits::{minimal_twos_complement_bytes, minimal_unsigned_bytes, BitBuffer};
use crate::error::{PerError, Result};

/// `n >= 16384` would require the fragmented length-determinant form; this
/// crate does not implement it (see spec §4.2, §7, §9).
pub const MAX_UNFRAGMENTED_LENGTH: usize = 16_384;

/// Number of bits needed to hold every value in `[min, max]`.
pub fn constrained_bit_count(min: &BigInt, max: &BigInt) -> Result<u32> {
    if max < min {
        return Err(PerError::schema_error(format!(
            "invalid constraint: max {max} < min {min}"
        )));
    }
    if max == min {
        return Ok(0);
    }
    let range = (max - min) + BigInt::from(1);
    Ok(log2_ceil(&range))
}

/// `ceil(log2(value))` for a positive `value`.
fn log2_ceil(value: &BigInt) -> u32 {
    debug_assert!(value.is_positive());
    let mut bits = value.bits() as u32;
    // `BigInt::bits` returns the minimum number of bits to represent the
    // value, i.e. floor(log2(value)) + 1. That's already ceil(log2(value))
    // unless value is itself an exact power of two, which needs one fewer.
    if value.magnitude_is_power_of_two() {
        bits -= 1;
    }
    bits
}

trait IsPowerOfTwo {
    fn magnitude_is_power_of_two(&self) -> bool;
}

impl IsPowerOfTwo for BigInt {
    fn magnitude_is_power_of_two(&self) -> bool {
        let magnitude = self.magnitude();
        !magnitude.is_zero() && (magnitude & (magnitude - BigUint::from(1u8))).is_zero()
    }
}

/// Encodes `value - min` in `constrained_bit_count(min, max)` bits.
pub fn encode_constrained(buf: &mut BitBuffer, value: &BigInt, min: &BigInt, max: &BigInt) -> Result<()> {
    if value < min || value > max {
        return Err(PerError::constraint(format!(
            "value {value} outside constraint [{min}, {max}]"
        )));
    }
    let bit_count = constrained_bit_count(min, max)?;
    if bit_count == 0 {
        return Ok(());
    }
    let offset = (value - min)
        .to_biguint()
        .expect("value >= min was checked above");
    buf.write_wide_bits(&offset, bit_count as usize)
}

/// Inverts [`encode_constrained`].
pub fn decode_constrained(buf: &mut BitBuffer, min: &BigInt, max: &BigInt) -> Result<BigInt> {
    let bit_count = constrained_bit_count(min, max)?;
    if bit_count == 0 {
        return Ok(min.clone());
    }
    let offset = buf.read_wide_bits(bit_count as usize)?;
    Ok(min + BigInt::from(offset))
}

/// Encodes `value - min` as a minimum-length unsigned big-endian byte
/// sequence, prefixed by its byte count as an unconstrained length
/// determinant.
pub fn encode_semi_constrained(buf: &mut BitBuffer, value: &BigInt, min: &BigInt) -> Result<()> {
    if value < min {
        return Err(PerError::constraint(format!(
            "value {value} below minimum {min}"
        )));
    }
    let offset = (value - min)
        .to_biguint()
        .expect("value >= min was checked above");
    let bytes = minimal_unsigned_bytes(&offset);
    encode_unconstrained_length(buf, bytes.len())?;
    buf.write_octets(&bytes)
}

/// Inverts [`encode_semi_constrained`].
pub fn decode_semi_constrained(buf: &mut BitBuffer, min: &BigInt) -> Result<BigInt> {
    let length = decode_unconstrained_length(buf)?;
    let bytes = buf.read_octets(length)?;
    let offset = BigUint::from_bytes_be(&bytes);
    Ok(min + BigInt::from(offset))
}

/// Encodes `value` as a minimum-length two's-complement big-endian byte
/// sequence, prefixed by its byte count as an unconstrained length
/// determinant.
pub fn encode_unconstrained_whole(buf: &mut BitBuffer, value: &BigInt) -> Result<()> {
    let bytes = minimal_twos_complement_bytes(value);
    encode_unconstrained_length(buf, bytes.len())?;
    buf.write_octets(&bytes)
}

/// Inverts [`encode_unconstrained_whole`].
pub fn decode_unconstrained_whole(buf: &mut BitBuffer) -> Result<BigInt> {
    let length = decode_unconstrained_length(buf)?;
    let bytes = buf.read_octets(length)?;
    Ok(BigInt::from_signed_bytes_be(&bytes))
}

/// Encodes an unconstrained length determinant per X.691 §10.9:
/// - `0..128`: one `0` bit then `n` in 7 bits.
/// - `128..16384`: bits `10` then `n` in 14 bits.
/// - `>= 16384`: [`PerError::Unsupported`] (fragmented form, not implemented).
pub fn encode_unconstrained_length(buf: &mut BitBuffer, n: usize) -> Result<()> {
    if n < 128 {
        buf.write_bit(false);
        buf.write_bits(n as u32, 7)?;
    } else if n < MAX_UNFRAGMENTED_LENGTH {
        buf.write_bit(true);
        buf.write_bit(false);
        buf.write_bits(n as u32, 14)?;
    } else {
        return Err(PerError::unsupported(
            format!("length {n} requires fragmentation (n >= {MAX_UNFRAGMENTED_LENGTH})"),
            Some(buf.offset()),
        ));
    }
    Ok(())
}

/// Inverts [`encode_unconstrained_length`]. A `11` prefix is the
/// fragmentation marker and is rejected with [`PerError::Unsupported`].
pub fn decode_unconstrained_length(buf: &mut BitBuffer) -> Result<usize> {
    let offset = buf.offset();
    if !buf.read_bit()? {
        return Ok(buf.read_bits(7)? as usize);
    }
    if !buf.read_bit()? {
        return Ok(buf.read_bits(14)? as usize);
    }
    Err(PerError::unsupported(
        "fragmented length determinant (11 prefix) is not supported",
        Some(offset),
    ))
}

/// Encodes a length determinant constrained to `[min, max]` (`SIZE`), per
/// X.691 §10.9.3: no bits if the range is a single value, a constrained
/// whole number for ranges up to 64K, else delegates to the unconstrained
/// form.
pub fn encode_constrained_length(buf: &mut BitBuffer, n: usize, min: usize, max: usize) -> Result<()> {
    if n < min || n > max {
        return Err(PerError::constraint(format!(
            "length {n} outside SIZE constraint [{min}, {max}]"
        )));
    }
    let range = max - min + 1;
    if range == 1 {
        return Ok(());
    }
    if range <= 65_536 {
        encode_constrained(
            buf,
            &BigInt::from(n),
            &BigInt::from(min),
            &BigInt::from(max),
        )
    } else {
        encode_unconstrained_length(buf, n)
    }
}

/// Inverts [`encode_constrained_length`].
pub fn decode_constrained_length(buf: &mut BitBuffer, min: usize, max: usize) -> Result<usize> {
    let range = max - min + 1;
    if range == 1 {
        return Ok(min);
    }
    if range <= 65_536 {
        let value = decode_constrained(buf, &BigInt::from(min), &BigInt::from(max))?;
        Ok(value
            .to_usize()
            .expect("constrained by [min, max] which both fit in usize"))
    } else {
        decode_unconstrained_length(buf)
    }
}

/// Encodes a "normally small" number (X.691 §10.6): `0` then 6 bits for
/// `n < 64`, else `1` then a semi-constrained whole number with `min = 0`.
pub fn encode_normally_small(buf: &mut BitBuffer, n: usize) -> Result<()> {
    if n < 64 {
        buf.write_bit(false);
        buf.write_bits(n as u32, 6)?;
        Ok(())
    } else {
        buf.write_bit(true);
        encode_semi_constrained(buf, &BigInt::from(n), &BigInt::from(0))
    }
}

/// Inverts [`encode_normally_small`].
pub fn decode_normally_small(buf: &mut BitBuffer) -> Result<usize> {
    if !buf.read_bit()? {
        Ok(buf.read_bits(6)? as usize)
    } else {
        let value = decode_semi_constrained(buf, &BigInt::from(0))?;
        Ok(value.to_usize().expect("normally-small decode is non-negative"))
    }
}
