//! Builds a graph of named codecs that may reference each other, including
//! recursively, via `$ref` (spec §4.7 "Lazy `$ref` registry").
//!
//! Building proceeds in two passes conceptually, though both happen in one
//! loop: every schema is turned into a codec first, with any `$ref` it
//! contains becoming a [`LazyCodec`](crate::codec::LazyCodec) that only
//! looks itself up in the registry on first use. By the time any encode or
//! decode call actually runs, every name in the input map has been
//! inserted, so the lookup always succeeds — recursive and
//! forward-referencing schemas resolve without a second pass.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::codec::{build_with_registry, CodecRef};
use crate::error::Result;
use crate::schema::Schema;

/// The registry a [`LazyCodec`](crate::codec::LazyCodec) resolves against.
/// `Rc<RefCell<_>>`, not `Arc<Mutex<_>>`: the codec graph is built and used
/// from a single thread (spec §9, "non-Sync by design").
pub type SharedRegistry = Rc<RefCell<HashMap<String, CodecRef>>>;

/// Builds every schema in `schemas` into a codec, wiring `$ref`s between
/// them through a shared registry, and returns the name-to-codec map.
pub fn build_all(schemas: &HashMap<String, Schema>) -> Result<HashMap<String, CodecRef>> {
    let registry: SharedRegistry = Rc::new(RefCell::new(HashMap::new()));
    for (name, schema) in schemas {
        let codec = build_with_registry(schema, Some(&registry))?;
        registry.borrow_mut().insert(name.clone(), codec);
    }
    Ok(registry.borrow().clone())
}
