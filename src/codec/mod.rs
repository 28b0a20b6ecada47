//! Type codecs: one object per ASN.1 type, each implementing `encode`,
//! `decode`, and `decode_with_metadata` against a [`BitBuffer`] (spec §2,
//! §4.3–§4.6).
//!
//! The codec graph is a sealed-trait-object DAG (spec §9): composite codecs
//! hold `Rc<dyn Codec>` children, and recursive types are broken by
//! [`lazy::LazyCodec`] indirection resolved through a
//! [registry](crate::registry).

mod bit_string;
mod boolean;
mod char_string;
mod choice;
mod enumerated;
mod integer;
mod lazy;
mod null;
mod object_identifier;
mod octet_string;
mod sequence;
mod sequence_of;
pub mod size;

pub use bit_string::BitStringCodec;
pub use boolean::BooleanCodec;
pub use char_string::{CharStringCodec, CharStringKind};
pub use choice::{Alternative, ChoiceCodec};
pub use enumerated::EnumeratedCodec;
pub use integer::IntegerCodec;
pub use lazy::LazyCodec;
pub use null::NullCodec;
pub use object_identifier::ObjectIdentifierCodec;
pub use octet_string::OctetStringCodec;
pub use sequence::{Field, SequenceCodec};
pub use sequence_of::SequenceOfCodec;

use std::rc::Rc;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::schema::Schema;
use crate::value::Value;

/// Shared capability every type codec implements.
///
/// `encode`/`decode`/`decode_with_metadata` are provided default methods
/// that handle the pre-encoded passthrough [`Value::Opaque`] uniformly
/// (spec §3, testable property 5): a codec never has to special-case it
/// itself. Implementors provide the `*_inner` methods with their real
/// per-type logic.
pub trait Codec: core::fmt::Debug {
    /// A short, stable name used in [`DecodedNode::codec_name`].
    fn name(&self) -> &'static str;

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()>;
    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value>;
    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode>;

    fn encode(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        if let Value::Opaque { bytes, bit_length } = value {
            return buf.write_raw_bits(bytes, *bit_length);
        }
        self.encode_inner(buf, value)
    }

    fn decode(&self, buf: &mut BitBuffer) -> Result<Value> {
        self.decode_inner(buf)
    }

    fn decode_with_metadata(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        self.decode_with_metadata_inner(buf)
    }
}

pub type CodecRef = Rc<dyn Codec>;

/// Records a leaf node's metadata once its value has been decoded and the
/// buffer has advanced past it.
pub(crate) fn leaf_node(
    buf: &BitBuffer,
    start: usize,
    value: Value,
    codec_name: &'static str,
) -> Result<DecodedNode> {
    let bit_length = buf.offset() - start;
    let raw_bytes = buf.extract_bits(start, bit_length)?;
    Ok(DecodedNode::leaf(value, start, bit_length, raw_bytes, codec_name))
}

/// Shifts every `bit_offset` in `node` (and its descendants) by `delta`:
/// an open-type-wrapped value is decoded against a standalone buffer
/// starting at bit 0, so its offsets need rebasing onto the enclosing
/// stream once decoded (spec §4.6, §4.5 open-type wrapping).
pub(crate) fn shift_node(mut node: DecodedNode, delta: usize) -> DecodedNode {
    node.bit_offset += delta;
    node.value = match node.value {
        crate::metadata::NodeValue::Leaf(v) => crate::metadata::NodeValue::Leaf(v),
        crate::metadata::NodeValue::Sequence(fields) => crate::metadata::NodeValue::Sequence(
            fields.into_iter().map(|(k, v)| (k, shift_node(v, delta))).collect(),
        ),
        crate::metadata::NodeValue::SequenceOf(items) => {
            crate::metadata::NodeValue::SequenceOf(items.into_iter().map(|v| shift_node(v, delta)).collect())
        }
        crate::metadata::NodeValue::Choice { key, value } => crate::metadata::NodeValue::Choice {
            key,
            value: Box::new(shift_node(*value, delta)),
        },
    };
    node
}

/// Builds a codec graph from a single schema tree with no enclosing
/// registry. Encountering `$ref` here is a [`PerError::SchemaError`]
/// (spec §4.7).
pub fn build(schema: &Schema) -> Result<CodecRef> {
    build_with_registry(schema, None)
}

pub(crate) fn build_with_registry(
    schema: &Schema,
    registry: Option<&crate::registry::SharedRegistry>,
) -> Result<CodecRef> {
    Ok(match schema {
        Schema::Boolean => Rc::new(BooleanCodec),
        Schema::Null => Rc::new(NullCodec),
        Schema::Integer { min, max, extensible } => {
            Rc::new(IntegerCodec::new(min.clone(), max.clone(), *extensible)?)
        }
        Schema::Enumerated {
            values,
            extension_values,
            extensible,
        } => Rc::new(EnumeratedCodec::new(
            values.clone(),
            extension_values.clone(),
            *extensible,
        )?),
        Schema::BitString { size } => Rc::new(BitStringCodec::new(size)?),
        Schema::OctetString { size } => Rc::new(OctetStringCodec::new(size)?),
        Schema::Ia5String { size, alphabet } => Rc::new(CharStringCodec::new(
            CharStringKind::Ia5,
            size,
            alphabet.as_deref(),
        )?),
        Schema::VisibleString { size, alphabet } => Rc::new(CharStringCodec::new(
            CharStringKind::Visible,
            size,
            alphabet.as_deref(),
        )?),
        Schema::Utf8String { size } => {
            Rc::new(CharStringCodec::new(CharStringKind::Utf8, size, None)?)
        }
        Schema::ObjectIdentifier => Rc::new(ObjectIdentifierCodec),
        Schema::Sequence {
            fields,
            extension_fields,
            extensible,
        } => {
            let build_field = |f: &crate::schema::Field| -> Result<Field> {
                Ok(Field {
                    name: f.name.clone(),
                    codec: build_with_registry(&f.schema, registry)?,
                    optional: f.optional,
                    default_value: f.default_value.clone(),
                })
            };
            let fields = fields.iter().map(build_field).collect::<Result<Vec<_>>>()?;
            let extension_fields = extension_fields
                .iter()
                .map(build_field)
                .collect::<Result<Vec<_>>>()?;
            Rc::new(SequenceCodec::new(fields, extension_fields, *extensible)?)
        }
        Schema::SequenceOf { item, size } => {
            let item_codec = build_with_registry(item, registry)?;
            Rc::new(SequenceOfCodec::new(item_codec, size)?)
        }
        Schema::Choice {
            alternatives,
            extension_alternatives,
            extensible,
        } => {
            let build_alt = |a: &crate::schema::Alternative| -> Result<Alternative> {
                Ok(Alternative {
                    name: a.name.clone(),
                    codec: build_with_registry(&a.schema, registry)?,
                })
            };
            let alternatives = alternatives.iter().map(build_alt).collect::<Result<Vec<_>>>()?;
            let extension_alternatives = extension_alternatives
                .iter()
                .map(build_alt)
                .collect::<Result<Vec<_>>>()?;
            Rc::new(ChoiceCodec::new(alternatives, extension_alternatives, *extensible)?)
        }
        Schema::Ref { name } => match registry {
            Some(registry) => Rc::new(LazyCodec::new(name.clone(), registry.clone())),
            None => {
                return Err(PerError::schema_error(format!(
                    "$ref({name}) encountered outside of a registry build"
                )))
            }
        },
    })
}
