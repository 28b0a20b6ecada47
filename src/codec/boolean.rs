use crate::bits::BitBuffer;
use crate::error::Result;
use crate::metadata::DecodedNode;
use crate::value::Value;

use super::{leaf_node, Codec};

/// `BOOLEAN`: a single bit, `1` for `true`.
#[derive(Debug, Clone, Copy)]
pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn name(&self) -> &'static str {
        "BOOLEAN"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Boolean(b) = value else {
            return Err(crate::error::PerError::schema_violation(format!(
                "expected a boolean, found {value:?}"
            )));
        };
        buf.write_bit(*b);
        Ok(())
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        Ok(Value::Boolean(buf.read_bit()?))
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
    fn round_trips_both_values() {
        for b in [true, false] {
            let mut buf = BitBuffer::new();
            BooleanCodec.encode(&mut buf, &Value::Boolean(b)).unwrap();
            assert_eq!(buf.bit_length(), 1);
            let mut reader = BitBuffer::from_bytes(&buf.to_bytes());
            assert_eq!(BooleanCodec.decode(&mut reader).unwrap(), Value::Boolean(b));
        }
    }
}
