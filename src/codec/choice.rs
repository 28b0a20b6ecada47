use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::{DecodedNode, NodeValue};
use crate::per::{decode_constrained, decode_normally_small, decode_unconstrained_length, encode_constrained, encode_normally_small, encode_unconstrained_length};
use crate::value::Value;

use super::{shift_node, CodecRef};

/// One alternative of a built [`ChoiceCodec`] (spec §4.6).
#[derive(Clone)]
pub struct Alternative {
    pub name: String,
    pub codec: CodecRef,
}

impl core::fmt::Debug for Alternative {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Alternative").field("name", &self.name).finish()
    }
}

/// `CHOICE`: a root alternative is a constrained index (zero bits when
/// there is a single non-extensible alternative) followed by its value
/// directly; an extension alternative is an extension bit, a
/// normally-small index, and an open-type-wrapped value (spec §4.6).
#[derive(Debug, Clone)]
pub struct ChoiceCodec {
    alternatives: Vec<Alternative>,
    extension_alternatives: Vec<Alternative>,
    extensible: bool,
}

impl ChoiceCodec {
    pub fn new(
        alternatives: Vec<Alternative>,
        extension_alternatives: Vec<Alternative>,
        extensible: bool,
    ) -> Result<Self> {
        if alternatives.is_empty() {
            return Err(PerError::schema_error("CHOICE requires at least one root alternative"));
        }
        if !extensible && !extension_alternatives.is_empty() {
            return Err(PerError::schema_error(
                "CHOICE has extension_alternatives but is not marked extensible",
            ));
        }
        Ok(Self {
            alternatives,
            extension_alternatives,
            extensible,
        })
    }

    fn root_index_bounds(&self) -> (BigInt, BigInt) {
        (BigInt::from(0), BigInt::from(self.alternatives.len() - 1))
    }
}

fn encode_open_type(buf: &mut BitBuffer, codec: &CodecRef, value: &Value) -> Result<()> {
    let mut inner = BitBuffer::new();
    codec.encode(&mut inner, value)?;
    let bytes = inner.to_bytes();
    encode_unconstrained_length(buf, bytes.len())?;
    buf.write_octets(&bytes)
}

fn decode_open_type(buf: &mut BitBuffer, codec: &CodecRef) -> Result<Value> {
    let length = decode_unconstrained_length(buf)?;
    let bytes = buf.read_octets(length)?;
    let mut inner = BitBuffer::from_bytes(&bytes);
    codec.decode(&mut inner)
}

fn decode_open_type_with_metadata(buf: &mut BitBuffer, codec: &CodecRef) -> Result<DecodedNode> {
    let length = decode_unconstrained_length(buf)?;
    let content_start = buf.offset();
    let bytes = buf.read_octets(length)?;
    let mut inner = BitBuffer::from_bytes(&bytes);
    let node = codec.decode_with_metadata(&mut inner)?;
    Ok(shift_node(node, content_start))
}

impl super::Codec for ChoiceCodec {
    fn name(&self) -> &'static str {
        "CHOICE"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Choice { key, value: chosen } = value else {
            return Err(PerError::schema_violation(format!(
                "expected a CHOICE, found {value:?}"
            )));
        };

        if let Some(index) = self.alternatives.iter().position(|a| &a.name == key) {
            if self.extensible {
                buf.write_bit(false);
            }
            let (min, max) = self.root_index_bounds();
            encode_constrained(buf, &BigInt::from(index), &min, &max)?;
            return self.alternatives[index].codec.encode(buf, chosen);
        }

        if let Some(index) = self.extension_alternatives.iter().position(|a| &a.name == key) {
            if !self.extensible {
                return Err(PerError::schema_violation(format!(
                    "CHOICE alternative {key:?} is an extension but the schema is not extensible"
                )));
            }
            buf.write_bit(true);
            encode_normally_small(buf, index)?;
            return encode_open_type(buf, &self.extension_alternatives[index].codec, chosen);
        }

        Err(PerError::schema_violation(format!(
            "unknown CHOICE alternative {key:?}"
        )))
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let is_extension = self.extensible && buf.read_bit()?;
        if is_extension {
            let start = buf.offset();
            let index = decode_normally_small(buf)?;
            let alt = self.extension_alternatives.get(index).ok_or_else(|| {
                PerError::invalid_encoding(format!("unknown CHOICE extension index {index}"), start)
            })?;
            let value = decode_open_type(buf, &alt.codec)?;
            return Ok(Value::choice(alt.name.clone(), value));
        }
        let (min, max) = self.root_index_bounds();
        let index = decode_constrained(buf, &min, &max)?;
        let index = index.to_usize().ok_or_else(|| {
            PerError::invalid_encoding("negative CHOICE root index", buf.offset())
        })?;
        let alt = &self.alternatives[index];
        let value = alt.codec.decode(buf)?;
        Ok(Value::choice(alt.name.clone(), value))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let is_extension = self.extensible && buf.read_bit()?;

        let (key, child) = if is_extension {
            let index_start = buf.offset();
            let index = decode_normally_small(buf)?;
            let alt = self.extension_alternatives.get(index).ok_or_else(|| {
                PerError::invalid_encoding(format!("unknown CHOICE extension index {index}"), index_start)
            })?;
            let child = decode_open_type_with_metadata(buf, &alt.codec)?;
            (alt.name.clone(), child)
        } else {
            let (min, max) = self.root_index_bounds();
            let index = decode_constrained(buf, &min, &max)?;
            let index = usize::try_from(index).map_err(|_| {
                PerError::invalid_encoding("negative CHOICE root index", buf.offset())
            })?;
            let alt = &self.alternatives[index];
            (alt.name.clone(), alt.codec.decode_with_metadata(buf)?)
        };

        let bit_length = buf.offset() - start;
        let raw_bytes = buf.extract_bits(start, bit_length)?;
        Ok(DecodedNode {
            value: NodeValue::Choice {
                key,
                value: Box::new(child),
            },
            bit_offset: start,
            bit_length,
            raw_bytes,
            codec_name: self.name(),
            optional: None,
            present: None,
            is_default: None,
            is_extension: Some(is_extension),
        })
    }
}
