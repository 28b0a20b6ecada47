use crate::bits::BitBuffer;
use crate::error::Result;
use crate::metadata::DecodedNode;
use crate::value::Value;

use super::{leaf_node, Codec};

/// `NULL`: zero bits.
#[derive(Debug, Clone, Copy)]
pub struct NullCodec;

impl Codec for NullCodec {
    fn name(&self) -> &'static str {
        "NULL"
    }

    fn encode_inner(&self, _buf: &mut BitBuffer, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            other => Err(crate::error::PerError::schema_violation(format!(
                "expected NULL, found {other:?}"
            ))),
        }
    }

    fn decode_inner(&self, _buf: &mut BitBuffer) -> Result<Value> {
        Ok(Value::Null)
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}
