use num_bigint::BigInt;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::per::{
    decode_constrained, decode_semi_constrained, decode_unconstrained_whole, encode_constrained,
    encode_semi_constrained, encode_unconstrained_whole,
};
use crate::value::Value;

use super::{leaf_node, Codec};

#[derive(Debug, Clone)]
enum Kind {
    Constrained { min: BigInt, max: BigInt },
    SemiConstrained { min: BigInt },
    Unconstrained,
}

impl Kind {
    fn in_root_range(&self, value: &BigInt) -> bool {
        match self {
            Self::Constrained { min, max } => value >= min && value <= max,
            Self::SemiConstrained { min } => value >= min,
            Self::Unconstrained => true,
        }
    }
}

/// `INTEGER`, dispatched on `{min?, max?, extensible?}` per spec §4.3.
#[derive(Debug, Clone)]
pub struct IntegerCodec {
    kind: Kind,
    extensible: bool,
}

impl IntegerCodec {
    pub fn new(min: Option<BigInt>, max: Option<BigInt>, extensible: bool) -> Result<Self> {
        let kind = match (min, max) {
            (Some(min), Some(max)) => {
                if max < min {
                    return Err(PerError::schema_error(format!(
                        "INTEGER constraint has max {max} < min {min}"
                    )));
                }
                Kind::Constrained { min, max }
            }
            (Some(min), None) => Kind::SemiConstrained { min },
            (None, None) => Kind::Unconstrained,
            (None, Some(_)) => {
                return Err(PerError::schema_error(
                    "INTEGER constraint cannot have a max without a min",
                ))
            }
        };
        Ok(Self { kind, extensible })
    }
}

impl Codec for IntegerCodec {
    fn name(&self) -> &'static str {
        "INTEGER"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Integer(value) = value else {
            return Err(PerError::schema_violation(format!(
                "expected an integer, found {value:?}"
            )));
        };

        if self.extensible {
            let in_range = self.kind.in_root_range(value);
            buf.write_bit(!in_range);
            if !in_range {
                return encode_unconstrained_whole(buf, value);
            }
        }

        match &self.kind {
            Kind::Constrained { min, max } => encode_constrained(buf, value, min, max),
            Kind::SemiConstrained { min } => encode_semi_constrained(buf, value, min),
            Kind::Unconstrained => encode_unconstrained_whole(buf, value),
        }
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        if self.extensible && buf.read_bit()? {
            return Ok(Value::Integer(decode_unconstrained_whole(buf)?));
        }
        let value = match &self.kind {
            Kind::Constrained { min, max } => decode_constrained(buf, min, max)?,
            Kind::SemiConstrained { min } => decode_semi_constrained(buf, min)?,
            Kind::Unconstrained => decode_unconstrained_whole(buf)?,
        };
        Ok(Value::Integer(value))
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
    fn constrained_rejects_out_of_range_when_non_extensible() {
        let codec = IntegerCodec::new(Some(0.into()), Some(255.into()), false).unwrap();
        let mut buf = BitBuffer::new();
        assert!(codec.encode(&mut buf, &Value::integer(256)).is_err());
    }

    #[test]
    fn extensible_escapes_to_unconstrained() {
        let codec = IntegerCodec::new(Some(0.into()), Some(255.into()), true).unwrap();
        let mut buf = BitBuffer::new();
        codec.encode(&mut buf, &Value::integer(1000)).unwrap();
        let mut reader = BitBuffer::from_bytes(&buf.to_bytes());
        assert_eq!(codec.decode(&mut reader).unwrap(), Value::integer(1000));
    }

    #[test]
    fn min_equals_max_encodes_zero_bits() {
        let codec = IntegerCodec::new(Some(7.into()), Some(7.into()), false).unwrap();
        let mut buf = BitBuffer::new();
        codec.encode(&mut buf, &Value::integer(7)).unwrap();
        assert_eq!(buf.bit_length(), 0);
    }

    #[test]
    fn unconstrained_round_trips_negative() {
        let codec = IntegerCodec::new(None, None, false).unwrap();
        let mut buf = BitBuffer::new();
        codec.encode(&mut buf, &Value::integer(-42)).unwrap();
        let mut reader = BitBuffer::from_bytes(&buf.to_bytes());
        assert_eq!(codec.decode(&mut reader).unwrap(), Value::integer(-42));
    }
}
