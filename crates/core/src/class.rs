//! Class metadata
//!
//! A [`ClassDescriptor`] is the serializable-type description of a class:
//! its stable name, ordered field list, optional supertype, hooks and
//! initializer. Descriptors are immutable once built and shared via `Arc`.
//!
//! # Field layout
//!
//! Instances store all fields of the supertype chain in one vector, root-most
//! class first:
//!
//! ```text
//! class User { user_name, password }      slot 0..2
//! class Vip extends User { level }        slot 2..3
//! ```

use crate::error::{Error, Result};
use crate::hooks::{
    ExternalHooks, HookKind, Hooks, ReadNoDataHook, ReadSlotHook, ReplaceHook, WriteSlotHook,
};
use crate::value::{Instance, ObjRef, Value};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Boolean
    Bool,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// 64-bit float
    Double,
    /// String (nullable)
    Str,
    /// Any value, typically a reference to another object
    Ref,
}

impl FieldType {
    /// Stream code of this type
    pub fn code(&self) -> u8 {
        match self {
            FieldType::Bool => b'Z',
            FieldType::Int => b'I',
            FieldType::Long => b'J',
            FieldType::Double => b'D',
            FieldType::Str => b'T',
            FieldType::Ref => b'L',
        }
    }

    /// Parse a stream code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'Z' => Some(FieldType::Bool),
            b'I' => Some(FieldType::Int),
            b'J' => Some(FieldType::Long),
            b'D' => Some(FieldType::Double),
            b'T' => Some(FieldType::Str),
            b'L' => Some(FieldType::Ref),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Str => "string",
            FieldType::Ref => "reference",
        }
    }
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    transient: bool,
}

impl FieldDescriptor {
    /// Create a persistent field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            transient: false,
        }
    }

    /// Create a transient field
    pub fn transient(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            transient: true,
            ..Self::new(name, field_type)
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field type
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Transient fields are never written and always decode to their default
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Normal construction logic, run by [`ClassDescriptor::instantiate`]
pub type Initializer = Arc<dyn Fn(&mut Instance) -> Result<()> + Send + Sync>;

/// Description of a class eligible (or not) for serialization
pub struct ClassDescriptor {
    name: String,
    serializable: bool,
    super_class: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    field_offset: usize,
    hooks: Hooks,
    initializer: Option<Initializer>,
}

impl ClassDescriptor {
    /// Start building a serializable class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Stable type identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether instances may be written
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Direct supertype
    pub fn super_class(&self) -> Option<&Arc<ClassDescriptor>> {
        self.super_class.as_ref()
    }

    /// Fields declared by this class only
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Declared hooks
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Check whether this class owns its entire encoding
    pub fn is_external(&self) -> bool {
        self.hooks.has(HookKind::External)
    }

    /// Number of fields including inherited ones
    pub fn total_fields(&self) -> usize {
        self.field_offset + self.fields.len()
    }

    /// Layout range of this class's own fields inside an instance
    pub fn slot_range(&self) -> Range<usize> {
        self.field_offset..self.total_fields()
    }

    /// All fields, root-most class first
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.ancestry().into_iter().flat_map(|c| c.fields.iter())
    }

    /// Field at a layout index
    pub fn field_at(&self, index: usize) -> Option<&FieldDescriptor> {
        if index >= self.total_fields() {
            return None;
        }
        if index >= self.field_offset {
            return self.fields.get(index - self.field_offset);
        }
        self.super_class.as_ref().and_then(|s| s.field_at(index))
    }

    /// Layout index of a field; the most-derived declaration wins
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.own_field_index(name)
            .map(|i| self.field_offset + i)
            .or_else(|| self.super_class.as_ref().and_then(|s| s.field_index(name)))
    }

    /// Index of a field among this class's own fields
    pub fn own_field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check whether this class is, or descends from, the named class
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.ancestry().iter().any(|c| c.name == name)
    }

    /// The supertype chain including this class, root-most first
    pub fn lineage(self: &Arc<Self>) -> Vec<Arc<ClassDescriptor>> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(|c| c.super_class.clone()) {
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// The classes that contribute a slot to the stream, root-most first.
    ///
    /// The chain stops at the first non-serializable supertype; fields of
    /// that supertype and its ancestors are neither written nor read.
    pub fn serializable_lineage(self: &Arc<Self>) -> Vec<Arc<ClassDescriptor>> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if !class.serializable {
                break;
            }
            current = class.super_class.clone();
            chain.push(class);
        }
        chain.reverse();
        chain
    }

    /// Construct an instance the normal way: defaults, then the initializer
    pub fn instantiate(self: &Arc<Self>) -> Result<ObjRef> {
        let mut instance = Instance::new(self.clone());
        if let Some(init) = &self.initializer {
            init(&mut instance)?;
        }
        Ok(ObjRef::from_instance(instance))
    }

    /// Construct an instance and assign fields by name
    pub fn new_instance(self: &Arc<Self>, values: &[(&str, Value)]) -> Result<ObjRef> {
        let object = self.instantiate()?;
        for (field, value) in values {
            object.set(field, value.clone())?;
        }
        Ok(object)
    }

    fn ancestry(&self) -> Vec<&ClassDescriptor> {
        let mut chain = vec![self];
        let mut current = self.super_class.as_deref();
        while let Some(class) = current {
            chain.push(class);
            current = class.super_class.as_deref();
        }
        chain.reverse();
        chain
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("serializable", &self.serializable)
            .field("super_class", &self.super_class.as_ref().map(|s| s.name()))
            .field("fields", &self.fields)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`ClassDescriptor`]
///
/// ```ignore
/// let people = ClassDescriptor::builder("People")
///     .field("name", FieldType::Str)
///     .field("age", FieldType::Int)
///     .build()?;
/// ```
pub struct ClassBuilder {
    name: String,
    serializable: bool,
    super_class: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    hooks: Hooks,
    initializer: Option<Initializer>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            name: name.into(),
            serializable: true,
            super_class: None,
            fields: Vec::new(),
            hooks: Hooks::default(),
            initializer: None,
        }
    }

    /// Mark the class as not eligible for serialization
    pub fn not_serializable(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Declare the direct supertype
    pub fn extends(mut self, parent: Arc<ClassDescriptor>) -> Self {
        self.super_class = Some(parent);
        self
    }

    /// Declare a persistent field
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type));
        self
    }

    /// Declare a transient field
    pub fn transient(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::transient(name, field_type));
        self
    }

    /// Substitute another value whenever an instance is written
    pub fn write_replace<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ObjRef) -> Result<Value> + Send + Sync + 'static,
    {
        self.hooks.write_replace = Some(Arc::new(hook) as ReplaceHook);
        self
    }

    /// Substitute another value whenever an instance has been read
    pub fn read_resolve<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ObjRef) -> Result<Value> + Send + Sync + 'static,
    {
        self.hooks.read_resolve = Some(Arc::new(hook) as ReplaceHook);
        self
    }

    /// Encode this class's slot with custom logic
    pub fn write_slot<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ObjRef, &mut dyn crate::SlotWrite) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.write_slot = Some(Arc::new(hook) as WriteSlotHook);
        self
    }

    /// Decode this class's slot with custom logic
    pub fn read_slot<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ObjRef, &mut dyn crate::SlotRead) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.read_slot = Some(Arc::new(hook) as ReadSlotHook);
        self
    }

    /// Initialize this class's fields when the stream carries no slot for it
    pub fn read_no_data<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ObjRef) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.read_no_data = Some(Arc::new(hook) as ReadNoDataHook);
        self
    }

    /// Take over the whole encoding of the object
    pub fn external<W, R>(mut self, write: W, read: R) -> Self
    where
        W: Fn(&ObjRef, &mut dyn crate::SlotWrite) -> Result<()> + Send + Sync + 'static,
        R: Fn(&ObjRef, &mut dyn crate::SlotRead) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.external = Some(ExternalHooks {
            write: Arc::new(write),
            read: Arc::new(read),
        });
        self
    }

    /// Normal construction logic
    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    /// Validate and freeze the class
    pub fn build(self) -> Result<Arc<ClassDescriptor>> {
        if self.name.is_empty() {
            return Err(Error::InvalidClass("class name must not be empty".to_string()));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::InvalidClass(format!(
                    "{}: duplicate field {}",
                    self.name, field.name
                )));
            }
        }
        if let Some(parent) = &self.super_class {
            if parent.is_subclass_of(&self.name) {
                return Err(Error::InvalidClass(format!(
                    "{}: supertype chain already contains this class",
                    self.name
                )));
            }
        }
        self.hooks.validate(&self.name)?;

        let field_offset = self.super_class.as_ref().map_or(0, |s| s.total_fields());
        Ok(Arc::new(ClassDescriptor {
            name: self.name,
            serializable: self.serializable,
            super_class: self.super_class,
            fields: self.fields,
            field_offset,
            hooks: self.hooks,
            initializer: self.initializer,
        }))
    }
}
