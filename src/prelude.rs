//! Convenient imports for Keepsake.
//!
//! ```ignore
//! use keepsake::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let value = keepsake::load("graph.ks", &registry)?;
//! ```

// Object model
pub use keepsake_core::{ClassDescriptor, FieldType, Instance, ObjRef, Value};

// Hooks
pub use keepsake_core::{SlotRead, SlotWrite};

// Registries
pub use keepsake_core::{SingletonRegistry, TypeRegistry};

// Error handling
pub use keepsake_core::{Error, Result};

// Sessions
pub use keepsake_stream::{ObjectInput, ObjectOutput, StreamConfig};

pub use std::sync::Arc;
