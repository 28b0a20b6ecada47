//! [`SchemaCodec`]: the high-level façade that turns a [`Schema`] plus a
//! [`Value`] into bytes and back, hiding the [`BitBuffer`] cursor and the
//! codec graph behind a small surface (spec §5, §6).

use crate::bits::BitBuffer;
use crate::codec::{self, Codec as _, CodecRef};
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::schema::Schema;
use crate::value::Value;

/// A schema compiled into a codec graph, ready to encode and decode values.
#[derive(Debug, Clone)]
pub struct SchemaCodec {
    codec: CodecRef,
}

impl SchemaCodec {
    /// Compiles `schema` into a codec graph. `$ref` anywhere in `schema` is
    /// a [`PerError::SchemaError`]; use
    /// [`registry::build_all`](crate::registry::build_all) for schemas that
    /// reference a named registry.
    pub fn new(schema: &Schema) -> Result<Self> {
        Ok(Self {
            codec: codec::build(schema)?,
        })
    }

    /// Wraps an already-built codec, e.g. one produced by
    /// [`registry::build_all`](crate::registry::build_all).
    #[must_use]
    pub fn from_codec(codec: CodecRef) -> Self {
        Self { codec }
    }

    /// Encodes `value`, returning the byte-padded result.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mut buf = BitBuffer::new();
        self.codec.encode(&mut buf, value)?;
        Ok(buf.to_bytes())
    }

    /// Encodes `value` as an upper-case hex string.
    pub fn encode_to_hex(&self, value: &Value) -> Result<String> {
        let mut buf = BitBuffer::new();
        self.codec.encode(&mut buf, value)?;
        Ok(buf.to_hex())
    }

    /// Encodes `value`, returning the exact bit-packed bytes alongside the
    /// bit length, suitable for embedding as a [`Value::Opaque`] passthrough
    /// in an enclosing schema (spec §3).
    pub fn encode_to_raw_bytes(&self, value: &Value) -> Result<(Vec<u8>, usize)> {
        let mut buf = BitBuffer::new();
        self.codec.encode(&mut buf, value)?;
        Ok((buf.to_bytes(), buf.bit_length()))
    }

    /// Decodes `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let mut buf = BitBuffer::from_bytes(bytes);
        self.codec.decode(&mut buf)
    }

    /// Decodes a hex string (see [`parse_hex`] for the accepted forms).
    pub fn decode_from_hex(&self, hex: &str) -> Result<Value> {
        self.decode(&parse_hex(hex)?)
    }

    /// Decodes `bytes`, recording bit-exact span metadata for every node.
    pub fn decode_with_metadata(&self, bytes: &[u8]) -> Result<DecodedNode> {
        let mut buf = BitBuffer::from_bytes(bytes);
        self.codec.decode_with_metadata(&mut buf)
    }

    /// Decodes a hex string with metadata; see [`Self::decode_from_hex`] and
    /// [`Self::decode_with_metadata`].
    pub fn decode_from_hex_with_metadata(&self, hex: &str) -> Result<DecodedNode> {
        self.decode_with_metadata(&parse_hex(hex)?)
    }
}

/// Parses a hex string into bytes, tolerating whitespace, mixed case, and
/// an optional trailing `h`/`H` suffix (spec §4.9, §6).
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let mut cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.ends_with(['h', 'H']) {
        cleaned.pop();
    }
    if cleaned.len() % 2 != 0 {
        return Err(PerError::invalid_argument(format!(
            "hex string {input:?} has an odd number of digits"
        )));
    }
    let mut bytes = Vec::with_capacity(cleaned.len() / 2);
    for chunk in cleaned.as_bytes().chunks(2) {
        let digits = core::str::from_utf8(chunk).expect("ASCII input stays valid UTF-8");
        let byte = u8::from_str_radix(digits, 16)
            .map_err(|_| PerError::invalid_argument(format!("invalid hex digits {digits:?} in {input:?}")))?;
        bytes.push(byte);
    }
    Ok(bytes)
}
