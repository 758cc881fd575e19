//! Byte stream for keepsake object graphs
//!
//! - [`ObjectOutput`]: write session, turns values into bytes
//! - [`ObjectInput`]: read session, rebuilds values against a [`TypeRegistry`]
//! - [`inspect`]: dumps any stream without a registry
//! - [`StreamConfig`]: depth and length limits
//!
//! The byte layout is documented in [`format`].
//!
//! [`TypeRegistry`]: keepsake_core::TypeRegistry

#![warn(missing_docs)]
#![warn(clippy::all)]

mod codec;
pub mod config;
pub mod descriptor;
pub mod format;
pub mod inspect;
pub mod reader;
pub mod refs;
pub mod writer;

pub use config::StreamConfig;
pub use descriptor::StreamClass;
pub use format::{StreamHeader, STREAM_FORMAT_VERSION, STREAM_MAGIC};
pub use inspect::{inspect, inspect_with_config, Inspection};
pub use reader::ObjectInput;
pub use refs::{Handle, HandleArena, ReferenceTable};
pub use writer::ObjectOutput;
