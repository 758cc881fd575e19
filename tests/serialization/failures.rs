//! Failure Mode Tests
//!
//! Every failure is reported as an error value; none is recoverable within
//! the session that raised it.

use keepsake::{ClassDescriptor, Error, FieldType, ObjRef, ObjectInput, StreamConfig, Value};

use crate::fixtures::*;
use crate::*;

fn read_with(bytes: &[u8], registry: &Arc<TypeRegistry>, config: StreamConfig) -> Result<Value> {
    ObjectInput::with_config(bytes, registry.clone(), config)?.read_object()
}

// =============================================================================
// WRITE SIDE
// =============================================================================

#[test]
fn test_non_serializable_root() {
    let obj = simple().instantiate().unwrap();
    let err = keepsake::to_bytes(&Value::Ref(obj)).unwrap_err();
    assert!(matches!(&err, Error::NotSerializable { type_name } if type_name == "Simple"));
    assert!(err.is_write_error());
}

#[test]
fn test_non_serializable_field() {
    let obj = complex()
        .new_instance(&[
            ("int_field", 1.into()),
            ("simple", Value::Ref(simple().instantiate().unwrap())),
        ])
        .unwrap();
    let err = keepsake::to_bytes(&Value::Ref(obj)).unwrap_err();
    assert!(matches!(err, Error::NotSerializable { type_name } if type_name == "Simple"));
}

#[test]
fn test_non_serializable_class_ignores_write_replace() {
    let town = ClassDescriptor::builder("Town")
        .not_serializable()
        .field("name", FieldType::Str)
        .write_replace(|_| Ok(Value::Ref(new_people("mofan", 20))))
        .build()
        .unwrap();
    let obj = town.new_instance(&[("name", "Beijing".into())]).unwrap();
    let err = keepsake::to_bytes(&Value::Ref(obj)).unwrap_err();
    assert!(matches!(err, Error::NotSerializable { type_name } if type_name == "Town"));
}

#[test]
fn test_null_non_serializable_field_is_fine() {
    let obj = complex().new_instance(&[("int_field", 1.into())]).unwrap();
    let registry = registry_of(&[complex()]);
    let value = roundtrip(&Value::Ref(obj), &registry).unwrap();
    assert_eq!(value.as_obj().unwrap().get("simple"), Some(Value::Null));
}

#[test]
fn test_write_hook_error_propagates() {
    let failing = ClassDescriptor::builder("Failing")
        .write_slot(|_, _| Err(Error::validation("refusing to write")))
        .build()
        .unwrap();
    let err = keepsake::to_bytes(&Value::Ref(failing.instantiate().unwrap())).unwrap_err();
    assert!(matches!(err, Error::Validation { message } if message == "refusing to write"));
}

// =============================================================================
// READ SIDE: CLASSES AND HOOKS
// =============================================================================

#[test]
fn test_validation_rejects_negative_age() {
    let obj = student()
        .new_instance(&[("name", "Tom".into()), ("age", (-1).into())])
        .unwrap();
    let registry = registry_of(&[student()]);
    let err = roundtrip(&Value::Ref(obj), &registry).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(err.is_read_error());
}

#[test]
fn test_unknown_type() {
    let registry = registry_of(&[]);
    let err = roundtrip(&Value::Ref(new_people("Mofan", 20)), &registry).unwrap_err();
    assert!(matches!(err, Error::UnknownType { type_name } if type_name == "People"));
}

#[test]
fn test_locally_non_serializable_class() {
    let local = ClassDescriptor::builder("People")
        .not_serializable()
        .field("name", FieldType::Str)
        .field("age", FieldType::Int)
        .build()
        .unwrap();
    let registry = registry_of(&[local]);
    let err = roundtrip(&Value::Ref(new_people("Mofan", 20)), &registry).unwrap_err();
    assert!(matches!(err, Error::IncompatibleClass { .. }));
}

#[test]
fn test_external_mismatch() {
    let plain_animal = ClassDescriptor::builder("Animal")
        .field("kind", FieldType::Str)
        .field("age", FieldType::Int)
        .build()
        .unwrap();
    let cat = animal().new_instance(&[("kind", "cat".into())]).unwrap();
    let registry = registry_of(&[plain_animal]);
    let err = roundtrip(&Value::Ref(cat), &registry).unwrap_err();
    assert!(matches!(err, Error::IncompatibleClass { type_name, .. } if type_name == "Animal"));
}

#[test]
fn test_hook_reading_past_slot_end() {
    let writer = ClassDescriptor::builder("Greedy")
        .field("only", FieldType::Int)
        .build()
        .unwrap();
    let reader = ClassDescriptor::builder("Greedy")
        .field("only", FieldType::Int)
        .read_slot(|_, slot| {
            slot.read_default_fields()?;
            slot.read_value().map(|_| ())
        })
        .build()
        .unwrap();
    let registry = registry_of(&[reader]);
    let err = roundtrip(&Value::Ref(writer.instantiate().unwrap()), &registry).unwrap_err();
    assert!(matches!(err, Error::CorruptStream(_)));
}

// =============================================================================
// READ SIDE: DAMAGED INPUT
// =============================================================================

#[test]
fn test_every_truncation_is_corruption() {
    let staff = ObjRef::sequence(vec![Value::Ref(new_people("Mofan", 20))]);
    let company = new_company("Anthropic", &staff);
    let bytes = keepsake::to_bytes(&Value::Ref(company)).unwrap();
    let registry = registry_of(&[crate::fixtures::company(), people()]);

    for len in 0..bytes.len() {
        let err = read_with(&bytes[..len], &registry, StreamConfig::default()).unwrap_err();
        assert!(err.is_corruption(), "prefix of {} bytes gave {:?}", len, err);
    }
    assert!(read_with(&bytes, &registry, StreamConfig::default()).is_ok());
}

#[test]
fn test_unknown_tag() {
    let mut bytes = keepsake::to_bytes_all(&[]).unwrap();
    bytes.push(0x00);
    let err = keepsake::from_bytes(&bytes, &registry_of(&[])).unwrap_err();
    assert!(matches!(err, Error::CorruptStream(_)));
}

#[test]
fn test_dangling_back_reference() {
    let mut bytes = keepsake::to_bytes_all(&[]).unwrap();
    bytes.extend_from_slice(&[0x78, 0, 0, 0, 0]);
    let err = keepsake::from_bytes(&bytes, &registry_of(&[])).unwrap_err();
    assert!(matches!(err, Error::CorruptStream(_)));
}

#[test]
fn test_foreign_magic() {
    let err = keepsake::from_bytes(&[0xAC, 0xED, 0x00, 0x05, 0x70], &registry_of(&[])).unwrap_err();
    assert!(matches!(err, Error::CorruptStream(_)));
}

#[test]
fn test_unsupported_version() {
    let mut bytes = keepsake::to_bytes(&Value::Int(1)).unwrap();
    bytes[3] = 2;
    let err = keepsake::from_bytes(&bytes, &registry_of(&[])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { version: 2 }));
}

// =============================================================================
// LIMITS
// =============================================================================

#[test]
fn test_depth_limit_on_read() {
    let mut head = new_node("tail");
    for i in 0..20 {
        let node = new_node(&format!("n{}", i));
        node.set("next", Value::Ref(head)).unwrap();
        head = node;
    }
    let bytes = keepsake::to_bytes(&Value::Ref(head)).unwrap();
    let registry = registry_of(&[node()]);

    let err = read_with(&bytes, &registry, StreamConfig::new().max_depth(8)).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded { limit: 8 }));
    assert!(read_with(&bytes, &registry, StreamConfig::default()).is_ok());
}

#[test]
fn test_string_limit_on_read() {
    let bytes = keepsake::to_bytes(&Value::from("a rather long string")).unwrap();
    let err = read_with(&bytes, &registry_of(&[]), StreamConfig::new().max_string_len(4)).unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { what: "string", limit: 4, .. }));
}

#[test]
fn test_sequence_limit_on_write() {
    let list = ObjRef::sequence(vec![Value::Null; 10]);
    let config = StreamConfig::new().max_sequence_len(3);
    let mut out = keepsake::ObjectOutput::with_config(Vec::new(), config).unwrap();
    let err = out.write_object(&Value::Ref(list)).unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { what: "sequence", limit: 3, actual: 10 }));
}

#[test]
fn test_sequence_limit_on_read() {
    let mut bytes = keepsake::to_bytes_all(&[]).unwrap();
    bytes.push(0x77);
    bytes.extend_from_slice(&1000u32.to_be_bytes());
    let config = StreamConfig::new().max_sequence_len(3);
    let err = read_with(&bytes, &registry_of(&[]), config).unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { what: "sequence", limit: 3, actual: 1000 }));
}

/// OBJECT followed by `count` nested supertype descriptions of class "A"
fn nested_class_descriptions(count: usize) -> Vec<u8> {
    let mut bytes = keepsake::to_bytes_all(&[]).unwrap();
    bytes.push(0x76);
    for _ in 0..count {
        bytes.push(0x79);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(b'A');
        bytes.push(0);
        bytes.extend_from_slice(&0u16.to_be_bytes());
    }
    bytes
}

#[test]
fn test_supertype_chain_limit_on_read() {
    let bytes = nested_class_descriptions(100_000);
    let err = read_with(&bytes, &registry_of(&[]), StreamConfig::new().max_depth(8)).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded { limit: 8 }));

    let err = keepsake::inspect_with_config(bytes.as_slice(), &StreamConfig::new().max_depth(8))
        .unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded { limit: 8 }));
}
