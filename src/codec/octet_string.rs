use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::schema::SizeConstraint;
use crate::value::Value;

use super::size::{decode_length, encode_length, ResolvedSize};
use super::{leaf_node, Codec};

/// `OCTET STRING`: size-constrained over a byte count.
#[derive(Debug, Clone)]
pub struct OctetStringCodec {
    size: ResolvedSize,
}

impl OctetStringCodec {
    pub fn new(size: &Option<SizeConstraint>) -> Result<Self> {
        Ok(Self {
            size: ResolvedSize::from_schema(size)?,
        })
    }
}

impl Codec for OctetStringCodec {
    fn name(&self) -> &'static str {
        "OCTET STRING"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Bytes(bytes) = value else {
            return Err(PerError::schema_violation(format!(
                "expected an OCTET STRING, found {value:?}"
            )));
        };
        encode_length(buf, &self.size, bytes.len())?;
        buf.write_octets(bytes)
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let (length, _is_extension) = decode_length(buf, &self.size)?;
        Ok(Value::Bytes(buf.read_octets(length)?))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}
