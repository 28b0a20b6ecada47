use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::per::{decode_unconstrained_length, encode_unconstrained_length};
use crate::value::Value;

use super::{leaf_node, Codec};

/// `OBJECT IDENTIFIER`: an unconstrained length determinant followed by
/// X.690 §8.19 content octets (spec §4.3, §6.8): the first two arcs
/// combined as `40*arc1 + arc2`, subsequent arcs as base-128 VLQ.
#[derive(Debug, Clone, Copy)]
pub struct ObjectIdentifierCodec;

fn encode_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    groups.reverse();
    out.extend(groups);
}

fn content_octets(arcs: &[u64]) -> Result<Vec<u8>> {
    if arcs.len() < 2 {
        return Err(PerError::constraint("OBJECT IDENTIFIER requires at least 2 arcs"));
    }
    let (arc1, arc2) = (arcs[0], arcs[1]);
    if arc1 > 2 {
        return Err(PerError::constraint(format!("OID first arc {arc1} must be 0, 1, or 2")));
    }
    if arc1 < 2 && arc2 > 39 {
        return Err(PerError::constraint(format!(
            "OID second arc {arc2} must be <= 39 when the first arc is 0 or 1"
        )));
    }
    let mut out = Vec::new();
    encode_base128(arc1 * 40 + arc2, &mut out);
    for &arc in &arcs[2..] {
        encode_base128(arc, &mut out);
    }
    Ok(out)
}

fn decode_content_octets(bytes: &[u8], bit_offset: usize) -> Result<Vec<u64>> {
    let mut arcs = Vec::new();
    let mut value: u64 = 0;
    let mut started = false;
    for &byte in bytes {
        started = true;
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            arcs.push(value);
            value = 0;
            started = false;
        }
    }
    if started {
        return Err(PerError::invalid_encoding(
            "truncated base-128 VLQ in OBJECT IDENTIFIER content",
            bit_offset,
        ));
    }
    if arcs.is_empty() {
        return Err(PerError::invalid_encoding("empty OBJECT IDENTIFIER content", bit_offset));
    }
    let first = arcs.remove(0);
    let arc1 = if first < 40 {
        0
    } else if first < 80 {
        1
    } else {
        2
    };
    let arc2 = first - arc1 * 40;
    let mut result = vec![arc1, arc2];
    result.extend(arcs);
    Ok(result)
}

impl Codec for ObjectIdentifierCodec {
    fn name(&self) -> &'static str {
        "OBJECT IDENTIFIER"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        let Value::ObjectIdentifier(arcs) = value else {
            return Err(PerError::schema_violation(format!(
                "expected an OBJECT IDENTIFIER, found {value:?}"
            )));
        };
        let content = content_octets(arcs)?;
        encode_unconstrained_length(buf, content.len())?;
        buf.write_octets(&content)
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        let start = buf.offset();
        let length = decode_unconstrained_length(buf)?;
        let bytes = buf.read_octets(length)?;
        Ok(Value::ObjectIdentifier(decode_content_octets(&bytes, start)?))
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        let start = buf.offset();
        let value = self.decode_inner(buf)?;
        leaf_node(buf, start, value, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_rsa_oid_per_spec_scenario() {
        // 1.2.840.113549.1.1.1 (RSA), spec §8 scenario 4.
        let codec = ObjectIdentifierCodec;
        let value = Value::ObjectIdentifier(vec![1, 2, 840, 113_549, 1, 1, 1]);
        let mut buf = BitBuffer::new();
        codec.encode(&mut buf, &value).unwrap();
        let bytes = buf.to_bytes();
        assert_eq!(bytes[0], 9); // 8-bit length determinant, value 9
        assert_eq!(
            &bytes[1..],
            &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01]
        );
        let mut reader = BitBuffer::from_bytes(&bytes);
        assert_eq!(codec.decode(&mut reader).unwrap(), value);
    }

    #[test]
    fn round_trips_boundary_arcs() {
        let codec = ObjectIdentifierCodec;
        for arcs in [vec![0, 0], vec![0, 39], vec![1, 39], vec![2, 999], vec![2, 999, 200, 5]] {
            let value = Value::ObjectIdentifier(arcs);
            let mut buf = BitBuffer::new();
            codec.encode(&mut buf, &value).unwrap();
            let mut reader = BitBuffer::from_bytes(&buf.to_bytes());
            assert_eq!(codec.decode(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn rejects_invalid_first_arc() {
        let codec = ObjectIdentifierCodec;
        let mut buf = BitBuffer::new();
        assert!(codec
            .encode(&mut buf, &Value::ObjectIdentifier(vec![3, 1]))
            .is_err());
    }
}
