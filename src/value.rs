//! The untyped value representation codecs encode from and decode into.
//!
//! Schemas are data, not Rust types, so values have to be too: [`Value`] is
//! a tagged union over everything a PER schema can describe (spec §9,
//! "Untyped value representation").

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A value admissible under some [`Schema`](crate::schema::Schema).
///
/// Adjacently tagged (`{"type": ..., "value": ...}`) rather than internally
/// tagged: several variants are newtypes over non-map content (`Integer`,
/// `Bytes`, `Text`, `ObjectIdentifier`, ...), which serde cannot represent
/// under an internal tag (spec §6.6 — this shape is part of the JSON schema
/// representation via `Field::default_value`, so it has to round-trip for
/// every variant, not just the struct-like ones).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Boolean(bool),
    Integer(BigInt),
    /// `OCTET STRING` / opaque byte content.
    Bytes(Vec<u8>),
    /// `BIT STRING`: content bytes plus the exact number of significant bits.
    BitString { bytes: Vec<u8>, bit_length: usize },
    /// Character-string types (`IA5String`, `VisibleString`, `UTF8String`).
    Text(String),
    /// `OBJECT IDENTIFIER`, as its dot-notation arc sequence.
    ObjectIdentifier(Vec<u64>),
    Null,
    /// `SEQUENCE`: field name to value, in declaration order.
    Sequence(IndexMap<String, Value>),
    /// `SEQUENCE OF`.
    SequenceOf(Vec<Value>),
    /// `CHOICE`: the chosen alternative's name and its value.
    Choice { key: String, value: Box<Value> },
    /// A value whose encoding is already known. Written verbatim wherever a
    /// plain value would otherwise be encoded (spec §3, "Pre-encoded
    /// passthrough value").
    Opaque { bytes: Vec<u8>, bit_length: usize },
    /// The absence of an `OPTIONAL` value.
    None,
}

impl Value {
    #[must_use]
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn sequence(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self::Sequence(fields.into_iter().collect())
    }

    #[must_use]
    pub fn choice(key: impl Into<String>, value: Value) -> Self {
        Self::Choice {
            key: key.into(),
            value: Box::new(value),
        }
    }

    #[must_use]
    pub fn opaque(bytes: Vec<u8>, bit_length: usize) -> Self {
        Self::Opaque { bytes, bit_length }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Sequence(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Self::Integer(v) => Some(v),
            _ => None,
        }
    }
}

/// Structural (deep) equality for DEFAULT comparison: componentwise for
/// bytes, order-insensitive key-matched recursion for sequences, since a
/// default materialized by the decoder and a hand-built value with the same
/// fields in a different order must still compare equal (spec §9).
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (
            Value::BitString {
                bytes: xb,
                bit_length: xl,
            },
            Value::BitString {
                bytes: yb,
                bit_length: yl,
            },
        ) => xl == yl && xb == yb,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::ObjectIdentifier(x), Value::ObjectIdentifier(y)) => x == y,
        (Value::Null, Value::Null) | (Value::None, Value::None) => true,
        (Value::Sequence(x), Value::Sequence(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        (Value::SequenceOf(x), Value::SequenceOf(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (
            Value::Choice { key: xk, value: xv },
            Value::Choice { key: yk, value: yv },
        ) => xk == yk && values_equal(xv, yv),
        (
            Value::Opaque {
                bytes: xb,
                bit_length: xl,
            },
            Value::Opaque {
                bytes: yb,
                bit_length: yl,
            },
        ) => xl == yl && xb == yb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_variants_round_trip_through_json() {
        // Internally-tagged serde cannot represent a newtype over non-map
        // content; adjacent tagging (`{"type", "value"}`) can.
        for value in [
            Value::Boolean(true),
            Value::integer(5),
            Value::Bytes(vec![1, 2, 3]),
            Value::text("hello"),
            Value::ObjectIdentifier(vec![1, 2, 840]),
        ] {
            let json = serde_json::to_string(&value).unwrap();
            assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), value);
        }
    }

    #[test]
    fn sequence_equality_is_order_insensitive() {
        let a = Value::sequence([
            ("a".to_string(), Value::integer(1)),
            ("b".to_string(), Value::integer(2)),
        ]);
        let b = Value::sequence([
            ("b".to_string(), Value::integer(2)),
            ("a".to_string(), Value::integer(1)),
        ]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn differing_sequences_are_not_equal() {
        let a = Value::sequence([("a".to_string(), Value::integer(1))]);
        let b = Value::sequence([("a".to_string(), Value::integer(2))]);
        assert!(!values_equal(&a, &b));
    }
}
