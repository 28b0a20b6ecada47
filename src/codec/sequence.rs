use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::{DecodedNode, NodeValue};
use crate::per::{decode_normally_small, decode_unconstrained_length, encode_normally_small, encode_unconstrained_length};
use crate::value::{values_equal, Value};

use super::{shift_node, CodecRef};

use indexmap::IndexMap;

/// One field of a built [`SequenceCodec`] (spec §4.6).
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub codec: CodecRef,
    pub optional: bool,
    pub default_value: Option<Value>,
}

impl Field {
    fn is_optional_or_default(&self) -> bool {
        self.optional || self.default_value.is_some()
    }
}

impl core::fmt::Debug for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("has_default", &self.default_value.is_some())
            .finish()
    }
}

/// `SEQUENCE`: a preamble bitmap marking which `OPTIONAL`/`DEFAULT` root
/// fields are present, the root fields in declaration order, and — when
/// extensible — an extension bit followed by a single flat extension
/// addition group (spec §4.6, §9 "flat extension groups").
#[derive(Debug, Clone)]
pub struct SequenceCodec {
    fields: Vec<Field>,
    extension_fields: Vec<Field>,
    extensible: bool,
}

impl SequenceCodec {
    pub fn new(fields: Vec<Field>, extension_fields: Vec<Field>, extensible: bool) -> Result<Self> {
        if !extensible && !extension_fields.is_empty() {
            return Err(PerError::schema_error(
                "SEQUENCE has extension_fields but is not marked extensible",
            ));
        }
        Ok(Self {
            fields,
            extension_fields,
            extensible,
        })
    }

    fn field_value<'a>(map: &'a IndexMap<String, Value>, field: &Field) -> Option<&'a Value> {
        map.get(&field.name).filter(|v| !matches!(v, Value::None))
    }

    /// Whether a root/extension field's value should actually be written:
    /// present, and (if it has a DEFAULT) differing from it — a value equal
    /// to its DEFAULT is always omitted on the wire (spec §9, "DEFAULT
    /// always omitted").
    fn is_present(field: &Field, value: Option<&Value>) -> bool {
        match (value, &field.default_value) {
            (None, _) => false,
            (Some(v), Some(default)) => !values_equal(v, default),
            (Some(_), None) => true,
        }
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

/// Decodes an open-type-wrapped extension addition, rebasing its metadata
/// offsets onto the content region within the enclosing stream.
fn decode_open_type_with_metadata(buf: &mut BitBuffer, codec: &CodecRef) -> Result<DecodedNode> {
    let length = decode_unconstrained_length(buf)?;
    let content_start = buf.offset();
    let bytes = buf.read_octets(length)?;
    let mut inner = BitBuffer::from_bytes(&bytes);
    let node = codec.decode_with_metadata(&mut inner)?;
    Ok(shift_node(node, content_start))
}

impl super::Codec for SequenceCodec {
    fn name(&self) -> &'static str {
        "SEQUENCE"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Sequence(map) = value else {
            return Err(PerError::schema_violation(format!(
                "expected a SEQUENCE, found {value:?}"
            )));
        };

        let present_extensions: Vec<(&Field, &Value)> = self
            .extension_fields
            .iter()
            .filter_map(|f| Self::field_value(map, f).map(|v| (f, v)))
            .collect();

        if self.extensible {
            buf.write_bit(!present_extensions.is_empty());
        }

        for field in &self.fields {
            if field.is_optional_or_default() {
                let present = Self::is_present(field, Self::field_value(map, field));
                buf.write_bit(present);
            }
        }

        for field in &self.fields {
            let present_value = Self::field_value(map, field);
            if field.is_optional_or_default() {
                if Self::is_present(field, present_value) {
                    field.codec.encode(buf, present_value.expect("is_present implies Some"))?;
                }
            } else {
                let v = present_value.ok_or_else(|| {
                    PerError::schema_violation(format!("missing mandatory field {:?}", field.name))
                })?;
                field.codec.encode(buf, v)?;
            }
        }

        if !present_extensions.is_empty() {
            let count = self.extension_fields.len();
            encode_normally_small(buf, count - 1)?;
            for field in &self.extension_fields {
                buf.write_bit(Self::field_value(map, field).is_some());
            }
            for (field, v) in &present_extensions {
                encode_open_type(buf, &field.codec, v)?;
            }
        }

        Ok(())
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let has_extensions = if self.extensible { buf.read_bit()? } else { false };

        let mut present = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            present.push(if field.is_optional_or_default() {
                buf.read_bit()?
            } else {
                true
            });
        }

        let mut map = IndexMap::with_capacity(self.fields.len());
        for (field, is_present) in self.fields.iter().zip(present) {
            if is_present {
                map.insert(field.name.clone(), field.codec.decode(buf)?);
            } else if let Some(default) = &field.default_value {
                map.insert(field.name.clone(), default.clone());
            }
        }

        if has_extensions {
            let count = decode_normally_small(buf)? + 1;
            let mut extension_present = Vec::with_capacity(count);
            for _ in 0..count {
                extension_present.push(buf.read_bit()?);
            }
            for (i, is_present) in extension_present.into_iter().enumerate() {
                if !is_present {
                    continue;
                }
                match self.extension_fields.get(i) {
                    Some(field) => {
                        let value = decode_open_type(buf, &field.codec)?;
                        map.insert(field.name.clone(), value);
                    }
                    None => {
                        // An unknown extension addition from a later schema
                        // version: consume and discard it (spec §4.6).
                        let length = decode_unconstrained_length(buf)?;
                        buf.read_octets(length)?;
                    }
                }
            }
        }

        Ok(Value::Sequence(map))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let has_extensions = if self.extensible { buf.read_bit()? } else { false };

        let mut present = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            present.push(if field.is_optional_or_default() {
                buf.read_bit()?
            } else {
                true
            });
        }

        let mut children = IndexMap::with_capacity(self.fields.len());
        for (field, is_present) in self.fields.iter().zip(present) {
            let has_default = field.default_value.is_some();
            if is_present {
                let node = field
                    .codec
                    .decode_with_metadata(buf)?
                    .with_field_flags(field.optional, true, false, false);
                children.insert(field.name.clone(), node);
            } else if let Some(default) = &field.default_value {
                let node = DecodedNode::leaf(default.clone(), buf.offset(), 0, Vec::new(), "DEFAULT")
                    .with_field_flags(field.optional, false, true, false);
                children.insert(field.name.clone(), node);
            } else {
                let node = DecodedNode::leaf(Value::None, buf.offset(), 0, Vec::new(), "absent")
                    .with_field_flags(field.optional, false, has_default, false);
                children.insert(field.name.clone(), node);
            }
        }

        if has_extensions {
            let count = decode_normally_small(buf)? + 1;
            let mut extension_present = Vec::with_capacity(count);
            for _ in 0..count {
                extension_present.push(buf.read_bit()?);
            }
            for (i, is_present) in extension_present.into_iter().enumerate() {
                if !is_present {
                    continue;
                }
                match self.extension_fields.get(i) {
                    Some(field) => {
                        let node = decode_open_type_with_metadata(buf, &field.codec)?
                            .with_field_flags(true, true, false, true);
                        children.insert(field.name.clone(), node);
                    }
                    None => {
                        let length = decode_unconstrained_length(buf)?;
                        buf.read_octets(length)?;
                    }
                }
            }
        }

        let bit_length = buf.offset() - start;
        let raw_bytes = buf.extract_bits(start, bit_length)?;
        Ok(DecodedNode {
            value: NodeValue::Sequence(children),
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
