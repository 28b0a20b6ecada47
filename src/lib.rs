//! A schema-driven codec for ASN.1's Packed Encoding Rules, unaligned
//! variant (PER-UNALIGNED, X.691).
//!
//! Unlike a derive-macro-driven ASN.1 framework, this crate has no compiled
//! Rust type per ASN.1 type: a [`Schema`] describes the type declaratively
//! (and is itself `Serialize`/`Deserialize`, so it can be loaded from JSON
//! at runtime), [`codec::build`] compiles it into a graph of [`Codec`]
//! trait objects, and an untyped [`Value`] is what gets encoded or
//! produced by decoding.
//!
//! ```
//! use permute::{Schema, SchemaCodec, Value};
//!
//! let schema = Schema::Integer { min: Some(0.into()), max: Some(255.into()), extensible: false };
//! let codec = SchemaCodec::new(&schema).unwrap();
//! let bytes = codec.encode(&Value::integer(200)).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), Value::integer(200));
//! ```
//!
//! Recursive and mutually-referencing schemas go through
//! [`registry::build_all`] instead, which resolves `$ref` names lazily
//! against a shared registry rather than requiring the schema tree to be
//! acyclic.
//!
//! Decoding with [`SchemaCodec::decode_with_metadata`] additionally records,
//! for every node, the exact span of bits it was decoded from — see
//! [`metadata`] for why that matters for signature verification over
//! sub-structures.
//!
//! Out of scope: the ASN.1 textual grammar (`.asn` files), aligned PER,
//! BER/CER/DER, and any I/O, networking, or CLI glue; this crate only
//! turns already-parsed schemas and values into bits and back.

pub mod bits;
pub mod codec;
pub mod error;
pub mod facade;
pub mod metadata;
pub mod per;
pub mod registry;
pub mod schema;
pub mod value;

pub use codec::{Codec, CodecRef};
pub use error::{PerError, Result};
pub use facade::SchemaCodec;
pub use metadata::{strip_metadata, DecodedNode, NodeValue};
pub use registry::{build_all, SharedRegistry};
pub use schema::{Alternative as SchemaAlternative, Field as SchemaField, Schema, SizeConstraint};
pub use value::{values_equal, Value};
