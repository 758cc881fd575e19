//! Serialization Test Suite
//!
//! End-to-end tests through the public `keepsake` API: object identity
//! across fields and roots, every class hook, failure modes, and
//! file-backed sessions.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test serialization
//!
//! # Hook tests only
//! cargo test --test serialization hooks::
//! ```

use std::sync::Arc;

use keepsake::{Result, TypeRegistry, Value};

// Test modules
pub mod failures;
pub mod files;
pub mod fixtures;
pub mod identity;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Build a registry holding the given classes and their supertypes
pub fn registry_of(classes: &[Arc<keepsake::ClassDescriptor>]) -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    for class in classes {
        registry.register(class).unwrap();
    }
    Arc::new(registry)
}

/// Write one root and read it back in fresh sessions
pub fn roundtrip(value: &Value, registry: &Arc<TypeRegistry>) -> Result<Value> {
    let bytes = keepsake::to_bytes(value)?;
    keepsake::from_bytes(&bytes, registry)
}

/// Write several roots in one session and read them all back in one session
pub fn roundtrip_all(values: &[Value], registry: &Arc<TypeRegistry>) -> Result<Vec<Value>> {
    let bytes = keepsake::to_bytes_all(values)?;
    let mut input = keepsake::ObjectInput::new(bytes.as_slice(), registry.clone())?;
    input.read_to_end()
}
