//! Test classes
//!
//! Each constructor builds a fresh descriptor; readers find classes by name,
//! so descriptors built by separate calls are interchangeable.

use std::sync::Arc;

use keepsake::{ClassDescriptor, Error, FieldType, ObjRef, SingletonRegistry, Value};

/// Plain serializable class
pub fn people() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("People")
        .field("name", FieldType::Str)
        .field("age", FieldType::Int)
        .build()
        .unwrap()
}

pub fn new_people(name: &str, age: i32) -> ObjRef {
    people()
        .new_instance(&[("name", name.into()), ("age", age.into())])
        .unwrap()
}

/// Holds a reference to a shared staff list
pub fn company() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Company")
        .field("name", FieldType::Str)
        .field("staff", FieldType::Ref)
        .build()
        .unwrap()
}

pub fn new_company(name: &str, staff: &ObjRef) -> ObjRef {
    company()
        .new_instance(&[("name", name.into()), ("staff", Value::Ref(staff.clone()))])
        .unwrap()
}

/// Not serializable
pub fn simple() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Simple")
        .not_serializable()
        .field("string_field", FieldType::Str)
        .build()
        .unwrap()
}

/// Serializable, but references a non-serializable object
pub fn complex() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Complex")
        .field("int_field", FieldType::Int)
        .field("simple", FieldType::Ref)
        .build()
        .unwrap()
}

/// Same as [`complex`], with the reference marked transient
pub fn transient_complex() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("TransientComplex")
        .field("string_field", FieldType::Str)
        .transient("simple", FieldType::Ref)
        .field("bool_field", FieldType::Bool)
        .build()
        .unwrap()
}

/// Validates its age after the default fields are read
pub fn student() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Student")
        .field("name", FieldType::Str)
        .field("age", FieldType::Int)
        .read_slot(|obj, slot| {
            slot.read_default_fields()?;
            match obj.get_int("age") {
                Some(age) if age < 0 => Err(Error::validation(format!("age {} is negative", age))),
                _ => Ok(()),
            }
        })
        .build()
        .unwrap()
}

/// Writes its transient password by hand and falls back to placeholders
/// when the stream has no User slot
pub fn user() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("User")
        .field("user_name", FieldType::Str)
        .transient("password", FieldType::Str)
        .write_slot(|obj, slot| {
            slot.write_default_fields()?;
            slot.write_str(obj.get_str("password").as_deref())
        })
        .read_slot(|obj, slot| {
            slot.read_default_fields()?;
            let password = slot.read_str()?;
            obj.set("password", password)
        })
        .read_no_data(|obj| {
            obj.set("user_name", "Unknown")?;
            obj.set("password", "***")
        })
        .build()
        .unwrap()
}

/// Vip as the writer knows it: no supertype
pub fn vip_standalone() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Vip")
        .field("level", FieldType::Int)
        .build()
        .unwrap()
}

/// Vip as the reader knows it: a User
pub fn vip() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Vip")
        .extends(user())
        .field("level", FieldType::Int)
        .build()
        .unwrap()
}

/// Writes itself as a People record
pub fn city() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("City")
        .field("name", FieldType::Str)
        .write_replace(|_| Ok(Value::Ref(new_people("mofan", 20))))
        .build()
        .unwrap()
}

/// Reads back as a Simple
pub fn fruit() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Fruit")
        .field("name", FieldType::Str)
        .read_resolve(|_| {
            let replacement = simple().new_instance(&[("string_field", "Simple".into())])?;
            Ok(Value::Ref(replacement))
        })
        .build()
        .unwrap()
}

/// Reads back as the process-wide canonical instance
pub fn singleton() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Singleton")
        .field("id", FieldType::Int)
        .read_resolve(|_| Ok(Value::Ref(canonical_singleton())))
        .build()
        .unwrap()
}

pub fn canonical_singleton() -> ObjRef {
    SingletonRegistry::canonical("Singleton", || {
        singleton().new_instance(&[("id", 1.into())])
    })
    .unwrap()
}

/// Owns its whole encoding; `constructed` is only ever set by the initializer
pub fn animal() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Animal")
        .field("kind", FieldType::Str)
        .field("age", FieldType::Int)
        .transient("constructed", FieldType::Bool)
        .initializer(|instance| instance.set("constructed", true))
        .external(
            |obj, out| {
                out.write_str(obj.get_str("kind").as_deref())?;
                out.write_int(obj.get_int("age").unwrap_or_default())
            },
            |obj, input| {
                let kind = input.read_str()?;
                let age = input.read_int()?;
                obj.set("kind", kind)?;
                obj.set("age", age)
            },
        )
        .build()
        .unwrap()
}

/// Singly linked node, for cycles
pub fn node() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Node")
        .field("label", FieldType::Str)
        .field("next", FieldType::Ref)
        .build()
        .unwrap()
}

pub fn new_node(label: &str) -> ObjRef {
    node().new_instance(&[("label", label.into())]).unwrap()
}
