use num_bigint::BigInt;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::per::{decode_constrained, decode_normally_small, encode_constrained, encode_normally_small};
use crate::value::Value;

use super::{leaf_node, Codec};

/// `ENUMERATED`. Values are represented as [`Value::Text`] holding the
/// chosen identifier's name — ENUMERATED's abstract value is "an identifier
/// from a fixed set" (spec §3), and this crate's untyped [`Value`] has no
/// separate identifier variant, so the string representation doubles for
/// both.
#[derive(Debug, Clone)]
pub struct EnumeratedCodec {
    values: Vec<String>,
    extension_values: Vec<String>,
    extensible: bool,
}

impl EnumeratedCodec {
    pub fn new(values: Vec<String>, extension_values: Vec<String>, extensible: bool) -> Result<Self> {
        if values.is_empty() {
            return Err(PerError::schema_error("ENUMERATED must have at least one root value"));
        }
        Ok(Self {
            values,
            extension_values,
            extensible,
        })
    }
}

impl Codec for EnumeratedCodec {
    fn name(&self) -> &'static str {
        "ENUMERATED"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::Text(name) = value else {
            return Err(PerError::schema_violation(format!(
                "expected an ENUMERATED identifier, found {value:?}"
            )));
        };

        if let Some(index) = self.values.iter().position(|v| v == name) {
            if self.extensible {
                buf.write_bit(false);
            }
            encode_constrained(
                buf,
                &BigInt::from(index),
                &BigInt::from(0),
                &BigInt::from(self.values.len() - 1),
            )
        } else if self.extensible {
            if let Some(index) = self.extension_values.iter().position(|v| v == name) {
                buf.write_bit(true);
                encode_normally_small(buf, index)
            } else {
                Err(PerError::constraint(format!("unknown ENUMERATED value {name:?}")))
            }
        } else {
            Err(PerError::constraint(format!("unknown ENUMERATED value {name:?}")))
        }
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let from_extension = self.extensible && buf.read_bit()?;
        if from_extension {
            let index = decode_normally_small(buf)?;
            let name = self.extension_values.get(index).ok_or_else(|| {
                PerError::invalid_encoding(
                    format!("ENUMERATED extension index {index} is not declared"),
                    buf.offset(),
                )
            })?;
            Ok(Value::text(name.clone()))
        } else {
            let index = decode_constrained(buf, &BigInt::from(0), &BigInt::from(self.values.len() - 1))?;
            let index: usize = index.try_into().map_err(|_| {
                PerError::invalid_encoding("ENUMERATED index out of usize range", buf.offset())
            })?;
            let name = self.values.get(index).ok_or_else(|| {
                PerError::invalid_encoding(format!("ENUMERATED index {index} is not declared"), buf.offset())
            })?;
            Ok(Value::text(name.clone()))
        }
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}
