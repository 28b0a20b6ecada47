//! Error types returned by encode and decode operations.
//!
//! PER-unaligned has a single flat error taxonomy shared between encoding and
//! decoding (see the module-level docs on [`PerError`]); unlike a
//! multi-codec framework there is no per-wire-format `EncodeError`/`DecodeError`
//! split to maintain here.

use snafu::Snafu;

/// Every way an encode or decode operation can fail.
///
/// `bit_offset` is populated wherever the failure has a natural position in
/// the bit stream (most decode failures); it is `None` for failures detected
/// against a value or schema before any bits have been consumed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PerError {
    /// A value (or its size) falls outside the range its schema declares.
    #[snafu(display("value out of range: {message}"))]
    ConstraintViolation {
        message: String,
        bit_offset: Option<usize>,
    },

    /// The value being encoded does not have the shape the schema requires.
    #[snafu(display("value does not match schema: {message}"))]
    SchemaViolation {
        message: String,
        bit_offset: Option<usize>,
    },

    /// The schema itself is malformed.
    #[snafu(display("malformed schema: {message}"))]
    SchemaError { message: String },

    /// The decoded bit stream has a structure this schema cannot accept.
    #[snafu(display("invalid encoding: {message}"))]
    InvalidEncoding {
        message: String,
        bit_offset: Option<usize>,
    },

    /// A read ran past the end of the source bit stream.
    #[snafu(display("buffer underflow at bit {bit_offset}: needed {needed} more bit(s)"))]
    BufferUnderflow { bit_offset: usize, needed: usize },

    /// Bad caller input: an out-of-range bit count, malformed hex, etc.
    #[snafu(display("invalid argument: {message}"))]
    InvalidArgument { message: String },

    /// A feature this implementation does not support, most notably
    /// fragmented length determinants for lengths >= 16384.
    #[snafu(display("unsupported: {message}"))]
    Unsupported {
        message: String,
        bit_offset: Option<usize>,
    },
}

pub type Result<T, E = PerError> = core::result::Result<T, E>;

impl PerError {
    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
            bit_offset: None,
        }
    }

    pub(crate) fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
            bit_offset: None,
        }
    }

    pub(crate) fn schema_error(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_encoding(message: impl Into<String>, bit_offset: usize) -> Self {
        Self::InvalidEncoding {
            message: message.into(),
            bit_offset: Some(bit_offset),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>, bit_offset: Option<usize>) -> Self {
        Self::Unsupported {
            message: message.into(),
            bit_offset,
        }
    }

    /// The bit offset the failure occurred at, if this kind of failure
    /// carries one.
    #[must_use]
    pub fn bit_offset(&self) -> Option<usize> {
        match self {
            Self::ConstraintViolation { bit_offset, .. }
            | Self::InvalidEncoding { bit_offset, .. }
            | Self::Unsupported { bit_offset, .. }
            | Self::SchemaViolation { bit_offset, .. } => *bit_offset,
            Self::BufferUnderflow { bit_offset, .. } => Some(*bit_offset),
            Self::SchemaError { .. } | Self::InvalidArgument { .. } => None,
        }
    }
}
