use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::{DecodedNode, NodeValue};
use crate::schema::SizeConstraint;
use crate::value::Value;

use super::size::{decode_length, encode_length, ResolvedSize};
use super::CodecRef;

/// `SEQUENCE OF`: a size-constrained length determinant followed by that
/// many repetitions of a single homogeneous element codec (spec §4.6).
#[derive(Debug, Clone)]
pub struct SequenceOfCodec {
    item: CodecRef,
    size: ResolvedSize,
}

impl SequenceOfCodec {
    pub fn new(item: CodecRef, size: &Option<SizeConstraint>) -> Result<Self> {
        Ok(Self {
            item,
            size: ResolvedSize::from_schema(size)?,
        })
    }
}

impl super::Codec for SequenceOfCodec {
    fn name(&self) -> &'static str {
        "SEQUENCE OF"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::SequenceOf(items) = value else {
            return Err(PerError::schema_violation(format!(
                "expected a SEQUENCE OF, found {value:?}"
            )));
        };
        encode_length(buf, &self.size, items.len())?;
        for item in items {
            self.item.encode(buf, item)?;
        }
        Ok(())
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let (count, _is_extension) = decode_length(buf, &self.size)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.item.decode(buf)?);
        }
        Ok(Value::SequenceOf(items))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let (count, _is_extension) = decode_length(buf, &self.size)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.item.decode_with_metadata(buf)?);
        }
        let bit_length = buf.offset() - start;
        let raw_bytes = buf.extract_bits(start, bit_length)?;
        Ok(DecodedNode {
            value: NodeValue::SequenceOf(items),
            bit_offset: start,
            bit_length,
            raw_bytes,
            codec_name: self.name(),
            optional: None,
            present: None,
            is_default: None,
            is_extension: None,
        })
    }
}
