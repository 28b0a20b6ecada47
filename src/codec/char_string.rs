use num_bigint::BigInt;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::per::constrained_bit_count;
use crate::schema::SizeConstraint;
use crate::value::Value;

use super::size::{decode_length, encode_length, ResolvedSize};
use super::{leaf_node, Codec};

/// Which character-string type this codec implements (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharStringKind {
    /// Known-multiplier, default alphabet 0..=127.
    Ia5,
    /// Known-multiplier, default alphabet 32..=126.
    Visible,
    /// Length-prefixed raw UTF-8 bytes; no alphabet/character indexing.
    Utf8,
}

impl CharStringKind {
    fn default_alphabet(self) -> Vec<char> {
        match self {
            Self::Ia5 => (0..=127u8).map(char::from).collect(),
            Self::Visible => (32..=126u8).map(char::from).collect(),
            Self::Utf8 => Vec::new(),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Ia5 => "IA5String",
            Self::Visible => "VisibleString",
            Self::Utf8 => "UTF8String",
        }
    }
}

/// `IA5String` / `VisibleString` (known-multiplier) or `UTF8String`
/// (length-prefixed raw bytes), all sharing the size-constraint length
/// discipline of spec §4.2/§4.3.
#[derive(Debug, Clone)]
pub struct CharStringCodec {
    kind: CharStringKind,
    size: ResolvedSize,
    /// Sorted, deduplicated effective alphabet. Empty for UTF8String.
    alphabet: Vec<char>,
    /// `ceil(log2(alphabet.len()))`, zero when the alphabet has one char.
    char_width: u32,
}

impl CharStringCodec {
    pub fn new(kind: CharStringKind, size: &Option<SizeConstraint>, alphabet: Option<&str>) -> Result<Self> {
        let size = ResolvedSize::from_schema(size)?;
        if kind == CharStringKind::Utf8 {
            return Ok(Self {
                kind,
                size,
                alphabet: Vec::new(),
                char_width: 0,
            });
        }
        let mut effective: Vec<char> = match alphabet {
            Some(explicit) => explicit.chars().collect(),
            None => kind.default_alphabet(),
        };
        effective.sort_unstable();
        effective.dedup();
        if effective.is_empty() {
            return Err(PerError::schema_error(format!(
                "{} has an empty effective alphabet",
                kind.label()
            )));
        }
        let char_width = constrained_bit_count(&BigInt::from(0), &BigInt::from(effective.len() - 1))?;
        Ok(Self {
            kind,
            size,
            alphabet: effective,
            char_width,
        })
    }
}

impl Codec for CharStringCodec {
    fn name(&self) -> &'static str {
        self.kind.label()
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Text(text) = value else {
            return Err(PerError::schema_violation(format!(
                "expected {}, found {value:?}",
                self.kind.label()
            )));
        };

        if self.kind == CharStringKind::Utf8 {
            let bytes = text.as_bytes();
            encode_length(buf, &self.size, bytes.len())?;
            return buf.write_octets(bytes);
        }

        let chars: Vec<char> = text.chars().collect();
        encode_length(buf, &self.size, chars.len())?;
        for ch in chars {
            let index = self
                .alphabet
                .iter()
                .position(|candidate| *candidate == ch)
                .ok_or_else(|| PerError::constraint(format!("character {ch:?} is outside the permitted alphabet")))?;
            buf.write_bits(index as u32, self.char_width)?;
        }
        Ok(())
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        if self.kind == CharStringKind::Utf8 {
            let (length, _is_extension) = decode_length(buf, &self.size)?;
            let bytes = buf.read_octets(length)?;
            let text = String::from_utf8(bytes)
                .map_err(|e| PerError::invalid_encoding(format!("invalid UTF-8: {e}"), buf.offset()))?;
            return Ok(Value::Text(text));
        }

        let (length, _is_extension) = decode_length(buf, &self.size)?;
        let mut text = String::with_capacity(length);
        for _ in 0..length {
            let index = buf.read_bits(self.char_width)? as usize;
            let ch = self.alphabet.get(index).ok_or_else(|| {
                PerError::invalid_encoding(format!("character index {index} outside alphabet"), buf.offset())
            })?;
            text.push(*ch);
        }
        Ok(Value::Text(text))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}
