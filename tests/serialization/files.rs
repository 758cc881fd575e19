//! File-backed Session Tests

use keepsake::{StreamConfig, Value};

use crate::fixtures::*;
use crate::*;

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.ks");
    keepsake::save(&path, &Value::Ref(new_people("Mofan", 20))).unwrap();

    let registry = registry_of(&[people()]);
    let value = keepsake::load(&path, &registry).unwrap();
    assert_eq!(value.as_obj().unwrap().get_str("name").as_deref(), Some("Mofan"));
}

#[test]
fn test_save_all_shares_identity_across_roots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("companies.ks");
    let staff = keepsake::ObjRef::sequence(vec![Value::Ref(new_people("Mofan", 20))]);
    keepsake::save_all(
        &path,
        &[
            Value::Ref(new_company("first", &staff)),
            Value::Ref(new_company("second", &staff)),
        ],
    )
    .unwrap();

    let registry = registry_of(&[company(), people()]);
    let roots = keepsake::load_all(&path, &registry).unwrap();
    assert_eq!(roots.len(), 2);
    let a = roots[0].as_obj().unwrap().get("staff").unwrap();
    let b = roots[1].as_obj().unwrap().get("staff").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_failed_save_leaves_no_open_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ks");
    let obj = simple().instantiate().unwrap();
    assert!(keepsake::save(&path, &Value::Ref(obj)).is_err());

    // the file was closed on the error path, so it can be replaced
    keepsake::save(&path, &Value::Int(3)).unwrap();
    assert_eq!(keepsake::load(&path, &registry_of(&[])).unwrap(), Value::Int(3));
}

#[test]
fn test_config_file_limits_apply() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("limits.toml");
    std::fs::write(&config_path, "max_depth = 2\nbuffer_capacity = 64\n").unwrap();
    let config = StreamConfig::from_toml_file(&config_path).unwrap();

    let path = dir.path().join("nested.ks");
    let inner = keepsake::ObjRef::sequence(vec![]);
    let middle = keepsake::ObjRef::sequence(vec![Value::Ref(inner)]);
    let outer = keepsake::ObjRef::sequence(vec![Value::Ref(middle)]);
    keepsake::save(&path, &Value::Ref(outer)).unwrap();

    let err = keepsake::load_with_config(&path, &registry_of(&[]), &config).unwrap_err();
    assert!(matches!(err, keepsake::Error::DepthLimitExceeded { limit: 2 }));
}

#[test]
fn test_inspect_saved_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user.ks");
    let obj = user()
        .new_instance(&[("user_name", "mofan".into()), ("password", "12345678".into())])
        .unwrap();
    keepsake::save_all(&path, &[Value::Ref(obj.clone()), Value::Ref(obj)]).unwrap();

    let report = keepsake::inspect(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(report.roots, 2);
    assert_eq!(report.objects, 1);
    assert_eq!(report.back_references, 1);
    assert_eq!(report.classes, vec!["User"]);

    let expected = "\
root 0
  object #0 User
    slot User (custom)
      [0]: \"mofan\"
      [1]: \"12345678\"
root 1
  -> #0
";
    assert_eq!(report.text, expected);
}
