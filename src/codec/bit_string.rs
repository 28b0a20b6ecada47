use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::schema::SizeConstraint;
use crate::value::Value;

use super::size::{decode_length, encode_length, ResolvedSize};
use super::{leaf_node, Codec};

/// `BIT STRING`: size-constrained (fixed / min..max / unconstrained,
/// optionally extensible) over a bit count, not a byte count.
#[derive(Debug, Clone)]
pub struct BitStringCodec {
    size: ResolvedSize,
}

impl BitStringCodec {
    pub fn new(size: &Option<SizeConstraint>) -> Result<Self> {
        Ok(Self {
            size: ResolvedSize::from_schema(size)?,
        })
    }
}

impl Codec for BitStringCodec {
    fn name(&self) -> &'static str {
        "BIT STRING"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::BitString { bytes, bit_length } = value else {
            return Err(PerError::schema_violation(format!(
                "expected a BIT STRING, found {value:?}"
            )));
        };
        encode_length(buf, &self.size, *bit_length)?;
        buf.write_raw_bits(bytes, *bit_length)
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let (bit_length, _is_extension) = decode_length(buf, &self.size)?;
        let bytes = buf.read_raw_bits(bit_length)?;
        Ok(Value::BitString { bytes, bit_length })
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_non_byte_aligned_length() {
        let codec = BitStringCodec::new(&None).unwrap();
        let value = Value::BitString {
            bytes: vec![0b1011_0000],
            bit_length: 4,
        };
        let mut buf = BitBuffer::new();
        codec.encode(&mut buf, &value).unwrap();
        let mut reader = BitBuffer::from_bytes(&buf.to_bytes());
        assert_eq!(codec.decode(&mut reader).unwrap(), value);
    }

    #[test]
    fn fixed_size_rejects_mismatched_length() {
        let codec = BitStringCodec::new(&Some(SizeConstraint::fixed(8))).unwrap();
        let value = Value::BitString {
            bytes: vec![0xFF],
            bit_length: 4,
        };
        let mut buf = BitBuffer::new();
        assert!(codec.encode(&mut buf, &value).is_err());
    }
}
