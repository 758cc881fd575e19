//! Value and object model
//!
//! A [`Value`] is either an inline primitive or string, or a reference to a
//! heap [`Object`] through an [`ObjRef`]. Primitives compare by value;
//! references compare by identity. Serialization preserves both: equal
//! primitives stay equal, and two references to one object still point to
//! one object after a round trip.

use crate::class::{ClassDescriptor, FieldType};
use crate::error::{Error, Result};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// A field value or a root object
#[derive(Clone)]
pub enum Value {
    /// Absence of a reference or string
    Null,

    /// Boolean
    Bool(bool),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// 64-bit IEEE-754 floating point
    Double(f64),

    /// UTF-8 string (value semantics, no identity)
    Str(String),

    /// Reference to a heap object (identity semantics)
    Ref(ObjRef),
}

impl Value {
    /// Returns the kind name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Ref(_) => "reference",
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as object reference
    pub fn as_obj(&self) -> Option<&ObjRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Consume into an object reference
    pub fn into_obj(self) -> Option<ObjRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Check whether this value refers to an instance of the named class
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        self.as_obj().is_some_and(|r| r.is_instance_of(type_name))
    }
}

// References are equal only when they point at the same object.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}i", i),
            Value::Long(i) => write!(f, "{}L", i),
            Value::Double(d) => write!(f, "{:?}", d),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Ref(r) => write!(f, "{:?}", r),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Long(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Ref(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A heap object
#[derive(Debug)]
pub enum Object {
    /// An instance of a declared class
    Instance(Instance),

    /// An ordered, growable list of values
    Sequence(Vec<Value>),
}

impl Object {
    /// Try to get as instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Object::Instance(i) => Some(i),
            Object::Sequence(_) => None,
        }
    }

    /// Try to get as mutable instance
    pub fn as_instance_mut(&mut self) -> Option<&mut Instance> {
        match self {
            Object::Instance(i) => Some(i),
            Object::Sequence(_) => None,
        }
    }

    /// Try to get as sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Object::Sequence(items) => Some(items),
            Object::Instance(_) => None,
        }
    }

    /// Try to get as mutable sequence
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Object::Sequence(items) => Some(items),
            Object::Instance(_) => None,
        }
    }

    /// All reference slots of this object, for rebinding after a read-resolve
    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        match self {
            Object::Instance(i) => &mut i.values,
            Object::Sequence(items) => items,
        }
    }
}

/// An instance of a [`ClassDescriptor`]
///
/// Field values are laid out root-most class first, so every class of the
/// supertype chain owns a contiguous range (see [`ClassDescriptor::slot_range`]).
pub struct Instance {
    class: Arc<ClassDescriptor>,
    values: Vec<Value>,
}

impl Instance {
    /// Allocate an instance with every field at its default value.
    ///
    /// This does not run the class initializer; see
    /// [`ClassDescriptor::instantiate`] for normal construction.
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        let values = class
            .all_fields()
            .map(|f| f.field_type().default_value())
            .collect();
        Instance { class, values }
    }

    /// The class of this instance
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// All field values in layout order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a field by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.class.field_index(field).map(|i| &self.values[i])
    }

    /// Set a field by name, checking the value against the declared type
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.class.field_index(field).ok_or_else(|| Error::NoSuchField {
            type_name: self.class.name().to_string(),
            field: field.to_string(),
        })?;
        self.set_at(index, value.into())
    }

    /// Set a field by layout index
    pub fn set_at(&mut self, index: usize, value: Value) -> Result<()> {
        let descriptor = self.class.field_at(index).ok_or_else(|| Error::NoSuchField {
            type_name: self.class.name().to_string(),
            field: format!("#{}", index),
        })?;
        if !descriptor.field_type().accepts(&value) {
            return Err(Error::FieldTypeMismatch {
                type_name: self.class.name().to_string(),
                field: descriptor.name().to_string(),
                expected: descriptor.field_type().name(),
                actual: value.type_name(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    /// Reset a field to its type's default
    pub fn reset_at(&mut self, index: usize) {
        if let Some(descriptor) = self.class.field_at(index) {
            self.values[index] = descriptor.field_type().default_value();
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.class.name());
        for (descriptor, value) in self.class.all_fields().zip(&self.values) {
            s.field(descriptor.name(), value);
        }
        s.finish()
    }
}

/// Shared, identity-carrying handle to a heap [`Object`]
#[derive(Clone)]
pub struct ObjRef(Arc<RwLock<Object>>);

impl ObjRef {
    /// Wrap an object
    pub fn new(object: Object) -> Self {
        ObjRef(Arc::new(RwLock::new(object)))
    }

    /// Wrap an instance
    pub fn from_instance(instance: Instance) -> Self {
        Self::new(Object::Instance(instance))
    }

    /// Create a sequence object
    pub fn sequence(items: Vec<Value>) -> Self {
        Self::new(Object::Sequence(items))
    }

    /// Identity of the object (its address), stable while any handle is alive
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Check whether two handles point at the same object
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Lock for reading
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Lock for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Class of the object, `None` for sequences
    pub fn class(&self) -> Option<Arc<ClassDescriptor>> {
        self.read().as_instance().map(|i| i.class().clone())
    }

    /// Class name, or `"sequence"` for sequences
    pub fn type_name(&self) -> String {
        match &*self.read() {
            Object::Instance(i) => i.class().name().to_string(),
            Object::Sequence(_) => "sequence".to_string(),
        }
    }

    /// Check whether the object is an instance of the named class or one of its subclasses
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        self.class().is_some_and(|c| c.is_subclass_of(type_name))
    }

    /// Read a field of an instance by name (a clone of the value)
    pub fn get(&self, field: &str) -> Option<Value> {
        self.read().as_instance().and_then(|i| i.get(field).cloned())
    }

    /// Set a field of an instance by name
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut guard = self.write();
        match guard.as_instance_mut() {
            Some(instance) => instance.set(field, value),
            None => Err(Error::NoSuchField {
                type_name: "sequence".to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Convenience: read a string field
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.get(field).and_then(|v| v.as_str().map(str::to_string))
    }

    /// Convenience: read an int field
    pub fn get_int(&self, field: &str) -> Option<i32> {
        self.get(field).and_then(|v| v.as_int())
    }

    /// Elements of a sequence (clones), `None` for instances
    pub fn elements(&self) -> Option<Vec<Value>> {
        self.read().as_sequence().map(<[Value]>::to_vec)
    }

    /// Replace every reference to `from` held directly by this object with `to`.
    ///
    /// Returns how many slots were rewritten.
    pub fn rebind_references(&self, from: &ObjRef, to: &Value) -> usize {
        let mut guard = self.write();
        let mut count = 0;
        for slot in guard.values_mut() {
            if matches!(slot, Value::Ref(r) if r.ptr_eq(from)) {
                *slot = to.clone();
                count += 1;
            }
        }
        count
    }
}

// Debug never descends into fields: graphs may be cyclic.
impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(guard) => match &*guard {
                Object::Instance(i) => write!(f, "{}@{:x}", i.class().name(), self.id()),
                Object::Sequence(items) => write!(f, "sequence[{}]@{:x}", items.len(), self.id()),
            },
            None => write!(f, "<locked>@{:x}", self.id()),
        }
    }
}

impl FieldType {
    /// Check whether a value may be stored in a field of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Bool => matches!(value, Value::Bool(_)),
            FieldType::Int => matches!(value, Value::Int(_)),
            FieldType::Long => matches!(value, Value::Long(_)),
            FieldType::Double => matches!(value, Value::Double(_)),
            FieldType::Str => matches!(value, Value::Str(_) | Value::Null),
            FieldType::Ref => true,
        }
    }

    /// Default value for a field of this type
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int => Value::Int(0),
            FieldType::Long => Value::Long(0),
            FieldType::Double => Value::Double(0.0),
            FieldType::Str | FieldType::Ref => Value::Null,
        }
    }
}
