//! Per-class customization hooks
//!
//! Hooks are resolved once, when a [`ClassDescriptor`](crate::ClassDescriptor)
//! is built. Dispatch is a plain field lookup on the descriptor: there is no
//! reflection and no inheritance. A subclass that wants its parent's
//! write-replace behaviour has to declare it again.
//!
//! Slot hooks receive a [`SlotWrite`] or [`SlotRead`] bound to one class of
//! the instance's supertype chain. The stream implementation lives in
//! `keepsake-stream`; this crate only defines the seam.

use crate::error::{Error, Result};
use crate::value::{ObjRef, Value};
use std::fmt;
use std::sync::Arc;

/// Output side of one class slot, handed to custom-write hooks
pub trait SlotWrite {
    /// Write this class's non-transient fields exactly as default encoding would
    fn write_default_fields(&mut self) -> Result<()>;

    /// Write an arbitrary value into the slot
    fn write_value(&mut self, value: &Value) -> Result<()>;

    /// Write a string (or null)
    fn write_str(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => self.write_value(&Value::Str(s.to_string())),
            None => self.write_value(&Value::Null),
        }
    }

    /// Write an int
    fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_value(&Value::Int(value))
    }

    /// Write a long
    fn write_long(&mut self, value: i64) -> Result<()> {
        self.write_value(&Value::Long(value))
    }

    /// Write a bool
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_value(&Value::Bool(value))
    }

    /// Write a double
    fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_value(&Value::Double(value))
    }
}

/// Input side of one class slot, handed to custom-read hooks
pub trait SlotRead {
    /// Populate this class's fields from the default-encoded part of the slot.
    ///
    /// Transient fields are never touched. If the slot ends early the
    /// remaining fields keep their defaults.
    fn read_default_fields(&mut self) -> Result<()>;

    /// Check whether the slot has unread data left
    fn has_remaining(&mut self) -> Result<bool>;

    /// Read the next value of the slot
    ///
    /// Reading past the end of the slot is a `CorruptStream` error.
    fn read_value(&mut self) -> Result<Value>;

    /// Read a string (or null)
    fn read_str(&mut self) -> Result<Option<String>> {
        match self.read_value()? {
            Value::Str(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Err(unexpected("string", &other)),
        }
    }

    /// Read an int
    fn read_int(&mut self) -> Result<i32> {
        match self.read_value()? {
            Value::Int(i) => Ok(i),
            other => Err(unexpected("int", &other)),
        }
    }

    /// Read a long
    fn read_long(&mut self) -> Result<i64> {
        match self.read_value()? {
            Value::Long(i) => Ok(i),
            other => Err(unexpected("long", &other)),
        }
    }

    /// Read a bool
    fn read_bool(&mut self) -> Result<bool> {
        match self.read_value()? {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected("bool", &other)),
        }
    }

    /// Read a double
    fn read_double(&mut self) -> Result<f64> {
        match self.read_value()? {
            Value::Double(d) => Ok(d),
            other => Err(unexpected("double", &other)),
        }
    }
}

fn unexpected(expected: &str, found: &Value) -> Error {
    Error::corrupt(format!(
        "expected {} in class slot, found {}",
        expected,
        found.type_name()
    ))
}

/// Substitutes another value for an object (write-replace, read-resolve)
pub type ReplaceHook = Arc<dyn Fn(&ObjRef) -> Result<Value> + Send + Sync>;

/// Writes one class slot
pub type WriteSlotHook = Arc<dyn Fn(&ObjRef, &mut dyn SlotWrite) -> Result<()> + Send + Sync>;

/// Reads one class slot
pub type ReadSlotHook = Arc<dyn Fn(&ObjRef, &mut dyn SlotRead) -> Result<()> + Send + Sync>;

/// Called for a class that has no slot in the stream
pub type ReadNoDataHook = Arc<dyn Fn(&ObjRef) -> Result<()> + Send + Sync>;

/// Hooks of a class that owns its entire encoding
#[derive(Clone)]
pub struct ExternalHooks {
    /// Writes the whole object
    pub write: WriteSlotHook,
    /// Reads the whole object into a freshly initialized instance
    pub read: ReadSlotHook,
}

/// The kinds of hook a class may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Substitute another value before writing
    WriteReplace,
    /// Substitute another value after reading
    ReadResolve,
    /// Custom encoding of the class's slot
    WriteSlot,
    /// Custom decoding of the class's slot
    ReadSlot,
    /// Initialization when the stream has no slot for the class
    ReadNoData,
    /// Whole-object encoding, built with the class initializer on read
    External,
}

/// Capability set of one class
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) write_replace: Option<ReplaceHook>,
    pub(crate) read_resolve: Option<ReplaceHook>,
    pub(crate) write_slot: Option<WriteSlotHook>,
    pub(crate) read_slot: Option<ReadSlotHook>,
    pub(crate) read_no_data: Option<ReadNoDataHook>,
    pub(crate) external: Option<ExternalHooks>,
}

impl Hooks {
    /// Write-replace hook, if declared
    pub fn write_replace(&self) -> Option<&ReplaceHook> {
        self.write_replace.as_ref()
    }

    /// Read-resolve hook, if declared
    pub fn read_resolve(&self) -> Option<&ReplaceHook> {
        self.read_resolve.as_ref()
    }

    /// Custom slot writer, if declared
    pub fn write_slot(&self) -> Option<&WriteSlotHook> {
        self.write_slot.as_ref()
    }

    /// Custom slot reader, if declared
    pub fn read_slot(&self) -> Option<&ReadSlotHook> {
        self.read_slot.as_ref()
    }

    /// Read-no-data hook, if declared
    pub fn read_no_data(&self) -> Option<&ReadNoDataHook> {
        self.read_no_data.as_ref()
    }

    /// External encoding pair, if declared
    pub fn external(&self) -> Option<&ExternalHooks> {
        self.external.as_ref()
    }

    /// Check whether a hook of the given kind is declared
    pub fn has(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::WriteReplace => self.write_replace.is_some(),
            HookKind::ReadResolve => self.read_resolve.is_some(),
            HookKind::WriteSlot => self.write_slot.is_some(),
            HookKind::ReadSlot => self.read_slot.is_some(),
            HookKind::ReadNoData => self.read_no_data.is_some(),
            HookKind::External => self.external.is_some(),
        }
    }

    /// All declared hook kinds
    pub fn kinds(&self) -> Vec<HookKind> {
        [
            HookKind::WriteReplace,
            HookKind::ReadResolve,
            HookKind::WriteSlot,
            HookKind::ReadSlot,
            HookKind::ReadNoData,
            HookKind::External,
        ]
        .into_iter()
        .filter(|k| self.has(*k))
        .collect()
    }

    /// Check whether no hook is declared
    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    pub(crate) fn validate(&self, class_name: &str) -> Result<()> {
        if self.external.is_some() && (self.write_slot.is_some() || self.read_slot.is_some()) {
            return Err(Error::InvalidClass(format!(
                "{}: external encoding cannot be combined with slot hooks",
                class_name
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
