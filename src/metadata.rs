//! Decoded nodes: a decoded value augmented with the bit-exact span of the
//! source bytes that produced it (spec §3 "Decoded node", §4.8).

use indexmap::IndexMap;

use crate::value::Value;

/// The per-composite shape of a decoded node's value, mirroring the shapes
/// [`Value`] takes for composites, but with children replaced by
/// [`DecodedNode`]s instead of plain [`Value`]s.
#[derive(Debug, Clone)]
pub enum NodeValue {
    /// A primitive leaf: `BOOLEAN`, `INTEGER`, `ENUMERATED`, `BIT STRING`,
    /// `OCTET STRING`, character strings, `OBJECT IDENTIFIER`, `NULL`, or an
    /// absent `OPTIONAL` field (`Value::None`).
    Leaf(Value),
    Sequence(IndexMap<String, DecodedNode>),
    SequenceOf(Vec<DecodedNode>),
    Choice { key: String, value: Box<DecodedNode> },
}

/// A decoded value plus the metadata spec §4.8 requires every codec's
/// `decode_with_metadata` to produce.
#[derive(Debug, Clone)]
pub struct DecodedNode {
    pub value: NodeValue,
    /// Cursor position (in bits) when this node started decoding.
    pub bit_offset: usize,
    /// Number of bits this node consumed.
    pub bit_length: usize,
    /// `extract_bits(source, bit_offset, bit_length)` of the source buffer.
    pub raw_bytes: Vec<u8>,
    /// Name of the codec that produced this node, for diagnostics.
    pub codec_name: &'static str,
    /// Whether the schema declares this field `OPTIONAL` (`SEQUENCE`
    /// children only).
    pub optional: Option<bool>,
    /// Whether this field was actually encoded (`SEQUENCE` children only).
    pub present: Option<bool>,
    /// Whether a `DEFAULT` value was materialized because the bitmap bit
    /// was `0` (`SEQUENCE` children only).
    pub is_default: Option<bool>,
    /// Whether this is an extension addition (`SEQUENCE`/`CHOICE` children).
    pub is_extension: Option<bool>,
}

impl DecodedNode {
    #[must_use]
    pub fn leaf(
        value: Value,
        bit_offset: usize,
        bit_length: usize,
        raw_bytes: Vec<u8>,
        codec_name: &'static str,
    ) -> Self {
        Self {
            value: NodeValue::Leaf(value),
            bit_offset,
            bit_length,
            raw_bytes,
            codec_name,
            optional: None,
            present: None,
            is_default: None,
            is_extension: None,
        }
    }

    #[must_use]
    pub fn with_field_flags(
        mut self,
        optional: bool,
        present: bool,
        is_default: bool,
        is_extension: bool,
    ) -> Self {
        self.optional = Some(optional);
        self.present = Some(present);
        self.is_default = Some(is_default);
        self.is_extension = Some(is_extension);
        self
    }
}

/// Reconstructs the plain value a fresh `decode` would produce: primitives
/// pass through, `SEQUENCE` omits absent `OPTIONAL` fields and materializes
/// `DEFAULT`s (already done by the decoder, so this is just unwrapping),
/// `SEQUENCE OF` becomes a plain list, `CHOICE` becomes `{key, value}`
/// (spec §4.8).
#[must_use]
pub fn strip_metadata(node: &DecodedNode) -> Value {
    match &node.value {
        NodeValue::Leaf(value) => value.clone(),
        NodeValue::Sequence(fields) => {
            let mut out = IndexMap::new();
            for (name, child) in fields {
                if child.present == Some(false) && child.optional == Some(true) {
                    continue;
                }
                out.insert(name.clone(), strip_metadata(child));
            }
            Value::Sequence(out)
        }
        NodeValue::SequenceOf(items) => {
            Value::SequenceOf(items.iter().map(strip_metadata).collect())
        }
        NodeValue::Choice { key, value } => Value::Choice {
            key: key.clone(),
            value: Box::new(strip_metadata(value)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_absent_optional_field() {
        let mut fields = IndexMap::new();
        fields.insert(
            "present".to_string(),
            DecodedNode::leaf(Value::integer(1), 0, 8, vec![1], "integer")
                .with_field_flags(true, true, false, false),
        );
        fields.insert(
            "absent".to_string(),
            DecodedNode::leaf(Value::None, 8, 0, vec![], "boolean")
                .with_field_flags(true, false, false, false),
        );
        let node = DecodedNode {
            value: NodeValue::Sequence(fields),
            bit_offset: 0,
            bit_length: 8,
            raw_bytes: vec![1],
            codec_name: "sequence",
            optional: None,
            present: None,
            is_default: None,
            is_extension: None,
        };
        let stripped = strip_metadata(&node);
        let map = stripped.as_sequence().unwrap();
        assert!(map.contains_key("present"));
        assert!(!map.contains_key("absent"));
    }
}
