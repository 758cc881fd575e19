//! # Keepsake
//!
//! Identity-preserving object graph serialization.
//!
//! Keepsake writes graphs of dynamically described objects to a compact,
//! self-describing byte stream and rebuilds them later, preserving shared
//! references and cycles. Classes opt in to serialization and may customize
//! it with hooks: substitution before writing or after reading, custom slot
//! encodings, initialization when the stream lacks a supertype's data, and
//! whole-object external encodings.
//!
//! ## Quick Start
//!
//! ```ignore
//! use keepsake::prelude::*;
//!
//! let people = ClassDescriptor::builder("People")
//!     .field("name", FieldType::Str)
//!     .field("age", FieldType::Int)
//!     .build()?;
//! let mofan = people.new_instance(&[("name", "Mofan".into()), ("age", 20.into())])?;
//!
//! let bytes = keepsake::to_bytes(&Value::Ref(mofan))?;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(&people)?;
//! let copy = keepsake::from_bytes(&bytes, &Arc::new(registry))?;
//! ```
//!
//! ## Sessions
//!
//! Identity is tracked per session. Every root written through one
//! [`ObjectOutput`] shares one reference table, so an object reachable from
//! several roots is written once and read back as one object. The file
//! helpers ([`save_all`], [`load_all`]) open exactly one session per call.

#![warn(missing_docs)]

mod io;

pub mod prelude;

// Re-export main entry points
pub use io::{
    from_bytes, load, load_all, load_all_with_config, load_with_config, save, save_all,
    save_all_with_config, save_with_config, to_bytes, to_bytes_all,
};

// Re-export the object model
pub use keepsake_core::{
    ClassBuilder, ClassDescriptor, Error, ExternalHooks, FieldDescriptor, FieldType, HookKind,
    Hooks, Instance, ObjRef, Object, Result, SingletonRegistry, SlotRead, SlotWrite,
    TypeRegistry, Value,
};

// Re-export the stream
pub use keepsake_stream::{
    inspect, inspect_with_config, Inspection, ObjectInput, ObjectOutput, StreamConfig,
    StreamHeader, STREAM_FORMAT_VERSION,
};
