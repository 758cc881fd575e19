//! Object Identity Tests
//!
//! Shared references and cycles survive a round trip; distinct objects stay
//! distinct.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use keepsake::{ClassDescriptor, FieldType, ObjRef, Value};

use crate::fixtures::*;
use crate::*;

// =============================================================================
// VALUE PRESERVATION
// =============================================================================

#[test]
fn test_people_roundtrip() {
    let registry = registry_of(&[people()]);
    let value = roundtrip(&Value::Ref(new_people("Mofan", 20)), &registry).unwrap();

    let obj = value.as_obj().unwrap();
    assert_eq!(obj.type_name(), "People");
    assert_eq!(obj.get_str("name").as_deref(), Some("Mofan"));
    assert_eq!(obj.get_int("age"), Some(20));
}

#[test]
fn test_scalar_kinds_roundtrip() {
    let registry = registry_of(&[]);
    let list = ObjRef::sequence(vec![
        Value::Null,
        Value::Bool(true),
        Value::Int(i32::MIN),
        Value::Long(i64::MAX),
        Value::Double(-0.5),
        Value::from("naïve"),
        Value::from(""),
    ]);
    let value = roundtrip(&Value::Ref(list.clone()), &registry).unwrap();
    assert_eq!(
        value.as_obj().unwrap().elements().unwrap(),
        list.elements().unwrap()
    );
}

#[test]
fn test_read_does_not_run_initializer() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let counted = ClassDescriptor::builder("Counted")
        .field("value", FieldType::Int)
        .initializer(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build()
        .unwrap();

    let original = counted.new_instance(&[("value", 7.into())]).unwrap();
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    let registry = registry_of(&[counted]);
    let value = roundtrip(&Value::Ref(original), &registry).unwrap();
    assert_eq!(value.as_obj().unwrap().get_int("value"), Some(7));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_subclass_fields_roundtrip() {
    let base = ClassDescriptor::builder("Base")
        .field("id", FieldType::Long)
        .build()
        .unwrap();
    let derived = ClassDescriptor::builder("Derived")
        .extends(base)
        .field("tag", FieldType::Str)
        .build()
        .unwrap();
    let obj = derived
        .new_instance(&[("id", Value::Long(99)), ("tag", "x".into())])
        .unwrap();

    let registry = registry_of(&[derived]);
    let value = roundtrip(&Value::Ref(obj), &registry).unwrap();
    let decoded = value.as_obj().unwrap();
    assert!(decoded.is_instance_of("Base"));
    assert_eq!(decoded.get("id"), Some(Value::Long(99)));
    assert_eq!(decoded.get_str("tag").as_deref(), Some("x"));
}

// =============================================================================
// SHARED REFERENCES
// =============================================================================

#[test]
fn test_shared_list_across_roots() {
    let staff = ObjRef::sequence(vec![
        Value::Ref(new_people("Mofan", 20)),
        Value::Ref(new_people("Tom", 30)),
    ]);
    let first = new_company("Anthropic", &staff);
    let second = new_company("Keepsake", &staff);

    let registry = registry_of(&[company(), people()]);
    let roots = roundtrip_all(&[Value::Ref(first), Value::Ref(second)], &registry).unwrap();
    assert_eq!(roots.len(), 2);

    let a = roots[0].as_obj().unwrap();
    let b = roots[1].as_obj().unwrap();
    assert!(!a.ptr_eq(b));

    let staff_a = a.get("staff").unwrap().into_obj().unwrap();
    let staff_b = b.get("staff").unwrap().into_obj().unwrap();
    assert!(staff_a.ptr_eq(&staff_b));
    assert!(!staff_a.ptr_eq(&staff));

    let members = staff_a.elements().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].as_obj().unwrap().get_str("name").as_deref(), Some("Tom"));
}

#[test]
fn test_separate_sessions_do_not_share() {
    let staff = ObjRef::sequence(vec![]);
    let first = new_company("A", &staff);
    let second = new_company("B", &staff);
    let registry = registry_of(&[company()]);

    let a = roundtrip(&Value::Ref(first), &registry).unwrap();
    let b = roundtrip(&Value::Ref(second), &registry).unwrap();
    let staff_a = a.as_obj().unwrap().get("staff").unwrap();
    let staff_b = b.as_obj().unwrap().get("staff").unwrap();
    assert_ne!(staff_a, staff_b);
}

#[test]
fn test_two_fields_one_instance() {
    let pair = ClassDescriptor::builder("Pair")
        .field("left", FieldType::Ref)
        .field("right", FieldType::Ref)
        .build()
        .unwrap();
    let shared = new_people("Mofan", 20);
    let obj = pair
        .new_instance(&[
            ("left", Value::Ref(shared.clone())),
            ("right", Value::Ref(shared)),
        ])
        .unwrap();

    let registry = registry_of(&[pair, people()]);
    let value = roundtrip(&Value::Ref(obj), &registry).unwrap();
    let decoded = value.as_obj().unwrap();
    assert_eq!(decoded.get("left"), decoded.get("right"));
}

#[test]
fn test_equal_values_stay_distinct() {
    let list = ObjRef::sequence(vec![
        Value::Ref(new_people("Twin", 1)),
        Value::Ref(new_people("Twin", 1)),
    ]);
    let registry = registry_of(&[people()]);
    let value = roundtrip(&Value::Ref(list), &registry).unwrap();
    let items = value.as_obj().unwrap().elements().unwrap();
    assert_ne!(items[0], items[1]);
}

// =============================================================================
// CYCLES
// =============================================================================

#[test]
fn test_self_cycle() {
    let node = new_node("loop");
    node.set("next", Value::Ref(node.clone())).unwrap();

    let registry = registry_of(&[crate::fixtures::node()]);
    let value = roundtrip(&Value::Ref(node), &registry).unwrap();
    let decoded = value.into_obj().unwrap();
    let next = decoded.get("next").unwrap().into_obj().unwrap();
    assert!(next.ptr_eq(&decoded));
}

#[test]
fn test_two_node_cycle() {
    let a = new_node("a");
    let b = new_node("b");
    a.set("next", Value::Ref(b.clone())).unwrap();
    b.set("next", Value::Ref(a.clone())).unwrap();

    let registry = registry_of(&[crate::fixtures::node()]);
    let value = roundtrip(&Value::Ref(a), &registry).unwrap();
    let decoded_a = value.into_obj().unwrap();
    let decoded_b = decoded_a.get("next").unwrap().into_obj().unwrap();

    assert_eq!(decoded_b.get_str("label").as_deref(), Some("b"));
    let back = decoded_b.get("next").unwrap().into_obj().unwrap();
    assert!(back.ptr_eq(&decoded_a));
}

#[test]
fn test_sequence_containing_itself() {
    let list = ObjRef::sequence(vec![Value::Int(1)]);
    list.write()
        .as_sequence_mut()
        .unwrap()
        .push(Value::Ref(list.clone()));

    let registry: Arc<keepsake::TypeRegistry> = registry_of(&[]);
    let value = roundtrip(&Value::Ref(list), &registry).unwrap();
    let decoded = value.into_obj().unwrap();
    let items = decoded.elements().unwrap();
    assert_eq!(items[0], Value::Int(1));
    assert!(items[1].as_obj().unwrap().ptr_eq(&decoded));
}
