//! The declarative schema tree: a JSON-serializable description of one
//! ASN.1 type, used to build a [`Codec`](crate::codec::Codec) graph.
//!
//! Field names and the JSON shape follow spec §3 and §6.6: an internally
//! tagged enum (`kind` discriminator) with unknown fields rejected.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A size constraint shared by `BIT STRING`, `OCTET STRING`, `SEQUENCE OF`,
/// and known-multiplier character strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeConstraint {
    /// Mutually exclusive with `min_size`/`max_size` (spec §3 invariant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub extensible: bool,
}

impl SizeConstraint {
    #[must_use]
    pub fn fixed(size: usize) -> Self {
        Self {
            fixed_size: Some(size),
            min_size: None,
            max_size: None,
            extensible: false,
        }
    }

    #[must_use]
    pub fn range(min: usize, max: usize) -> Self {
        Self {
            fixed_size: None,
            min_size: Some(min),
            max_size: Some(max),
            extensible: false,
        }
    }

    #[must_use]
    pub fn extensible_range(min: usize, max: usize) -> Self {
        Self {
            extensible: true,
            ..Self::range(min, max)
        }
    }

    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            fixed_size: None,
            min_size: None,
            max_size: None,
            extensible: false,
        }
    }

    #[must_use]
    pub fn validate(&self) -> bool {
        !(self.fixed_size.is_some() && (self.min_size.is_some() || self.max_size.is_some()))
    }
}

/// One field of a `SEQUENCE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl Field {
    #[must_use]
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: false,
            default_value: None,
        }
    }

    #[must_use]
    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: true,
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_default(name: impl Into<String>, schema: Schema, default_value: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: false,
            default_value: Some(default_value),
        }
    }

    #[must_use]
    pub fn is_optional_or_default(&self) -> bool {
        self.optional || self.default_value.is_some()
    }
}

/// One alternative of a `CHOICE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alternative {
    pub name: String,
    pub schema: Schema,
}

/// The declarative tree describing one ASN.1 type (spec §3).
///
/// Serializes to JSON as an internally tagged enum: `{"kind": "integer",
/// "min": 0, "max": 255}`, etc. Unknown fields are rejected on parse
/// (spec §6.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Schema {
    Boolean,
    Null,
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<BigInt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<BigInt>,
        #[serde(default, skip_serializing_if = "core::ops::Not::not")]
        extensible: bool,
    },
    Enumerated {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extension_values: Vec<String>,
        #[serde(default, skip_serializing_if = "core::ops::Not::not")]
        extensible: bool,
    },
    BitString {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
    },
    OctetString {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
    },
    Ia5String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alphabet: Option<String>,
    },
    VisibleString {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alphabet: Option<String>,
    },
    Utf8String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
    },
    ObjectIdentifier,
    Sequence {
        fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extension_fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "core::ops::Not::not")]
        extensible: bool,
    },
    SequenceOf {
        item: Box<Schema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<SizeConstraint>,
    },
    Choice {
        alternatives: Vec<Alternative>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extension_alternatives: Vec<Alternative>,
        #[serde(default, skip_serializing_if = "core::ops::Not::not")]
        extensible: bool,
    },
    /// Names a type in an enclosing registry (spec §3, §4.7).
    Ref { name: String },
}
