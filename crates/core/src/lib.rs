//! Core object model for keepsake
//!
//! This crate defines everything a serialized object graph is made of:
//! - [`Value`], [`ObjRef`], [`Object`], [`Instance`]: the dynamic object model
//! - [`ClassDescriptor`], [`FieldDescriptor`], [`FieldType`]: class metadata
//! - [`Hooks`], [`SlotWrite`], [`SlotRead`]: per-class customization points
//! - [`TypeRegistry`], [`SingletonRegistry`]: name and instance lookup
//! - [`Error`]: the error taxonomy shared by every crate in the workspace
//!
//! The byte format lives in `keepsake-stream`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod class;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod value;

pub use class::{ClassBuilder, ClassDescriptor, FieldDescriptor, FieldType, Initializer};
pub use error::{Error, Result};
pub use hooks::{
    ExternalHooks, HookKind, Hooks, ReadNoDataHook, ReadSlotHook, ReplaceHook, SlotRead,
    SlotWrite, WriteSlotHook,
};
pub use registry::{SingletonRegistry, TypeRegistry};
pub use value::{Instance, ObjRef, Object, Value};
