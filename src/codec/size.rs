//! The shared length-determinant discipline behind `BIT STRING`,
//! `OCTET STRING`, character strings, and `SEQUENCE OF` (spec §4.2, §4.3,
//! §4.6): fixed / min..max / unconstrained, optionally extensible.

use crate::error::{PerError, Result};
use crate::per::{decode_constrained_length, decode_unconstrained_length, encode_constrained_length, encode_unconstrained_length};
use crate::bits::BitBuffer;
use crate::schema::SizeConstraint;

#[derive(Debug, Clone)]
pub enum SizeKind {
    Unconstrained,
    Fixed(usize),
    Range { min: usize, max: usize },
}

#[derive(Debug, Clone)]
pub struct ResolvedSize {
    pub kind: SizeKind,
    pub extensible: bool,
}

impl ResolvedSize {
    pub fn from_schema(size: &Option<SizeConstraint>) -> Result<Self> {
        let Some(size) = size else {
            return Ok(Self {
                kind: SizeKind::Unconstrained,
                extensible: false,
            });
        };
        if !size.validate() {
            return Err(PerError::schema_error(
                "SIZE constraint cannot combine fixed_size with min_size/max_size",
            ));
        }
        let kind = if let Some(fixed) = size.fixed_size {
            SizeKind::Fixed(fixed)
        } else {
            match (size.min_size, size.max_size) {
                (Some(min), Some(max)) => SizeKind::Range { min, max },
                (None, None) => SizeKind::Unconstrained,
                _ => {
                    return Err(PerError::schema_error(
                        "SIZE range requires both min_size and max_size",
                    ))
                }
            }
        };
        Ok(Self {
            kind,
            extensible: size.extensible,
        })
    }

    pub fn unconstrained() -> Self {
        Self {
            kind: SizeKind::Unconstrained,
            extensible: false,
        }
    }

    fn in_root_range(&self, n: usize) -> bool {
        match &self.kind {
            SizeKind::Unconstrained => true,
            SizeKind::Fixed(f) => n == *f,
            SizeKind::Range { min, max } => n >= *min && n <= *max,
        }
    }
}

/// Writes the length determinant for `n`, per the size constraint's form,
/// returning whether the extension branch was used.
pub fn encode_length(buf: &mut BitBuffer, resolved: &ResolvedSize, n: usize) -> Result<bool> {
    if resolved.extensible {
        let in_range = resolved.in_root_range(n);
        buf.write_bit(!in_range);
        if !in_range {
            encode_unconstrained_length(buf, n)?;
            return Ok(true);
        }
    }
    match &resolved.kind {
        SizeKind::Unconstrained => encode_unconstrained_length(buf, n)?,
        SizeKind::Fixed(fixed) => {
            if n != *fixed {
                return Err(PerError::constraint(format!(
                    "length {n} does not match fixed size {fixed}"
                )));
            }
        }
        SizeKind::Range { min, max } => encode_constrained_length(buf, n, *min, *max)?,
    }
    Ok(false)
}

/// Inverts [`encode_length`], returning `(length, used_extension_branch)`.
pub fn decode_length(buf: &mut BitBuffer, resolved: &ResolvedSize) -> Result<(usize, bool)> {
    if resolved.extensible && buf.read_bit()? {
        return Ok((decode_unconstrained_length(buf)?, true));
    }
    let n = match &resolved.kind {
        SizeKind::Unconstrained => decode_unconstrained_length(buf)?,
        SizeKind::Fixed(fixed) => *fixed,
        SizeKind::Range { min, max } => decode_constrained_length(buf, *min, *max)?,
    };
    Ok((n, false))
}
