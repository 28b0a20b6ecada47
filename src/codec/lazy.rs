use once_cell::unsync::OnceCell;

use crate::bits::BitBuffer;
use crate::error::{PerError, Result};
use crate::metadata::DecodedNode;
use crate::value::Value;

use super::CodecRef;

/// A proxy standing in for a `$ref`-named codec until the enclosing
/// [registry](crate::registry) has finished building every named type
/// (spec §4.7): resolution happens lazily, on first use, since at
/// construction time the referenced codec may not exist yet (recursive
/// or forward-referencing schemas).
pub struct LazyCodec {
    name: String,
    registry: crate::registry::SharedRegistry,
    resolved: OnceCell<CodecRef>,
}

impl LazyCodec {
    #[must_use]
    pub fn new(name: String, registry: crate::registry::SharedRegistry) -> Self {
        Self {
            name,
            registry,
            resolved: OnceCell::new(),
        }
    }

    fn resolve(&self) -> Result<&CodecRef> {
        self.resolved.get_or_try_init(|| {
            self.registry
                .borrow()
                .get(&self.name)
                .cloned()
                .ok_or_else(|| PerError::schema_error(format!("unresolved $ref({})", self.name)))
        })
    }
}

impl core::fmt::Debug for LazyCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyCodec").field("name", &self.name).finish()
    }
}

impl super::Codec for LazyCodec {
    fn name(&self) -> &'static str {
        "$ref"
    }

    fn encode_inner(&self, buf: &mut BitBuffer, value: &Value) -> Result<()> {
        self.resolve()?.encode(buf, value)
    }

    fn decode_inner(&self, buf: &mut BitBuffer) -> Result<Value> {
        self.resolve()?.decode(buf)
    }

    fn decode_with_metadata_inner(&self, buf: &mut BitBuffer) -> Result<DecodedNode> {
        self.resolve()?.decode_with_metadata(buf)
    }
}
