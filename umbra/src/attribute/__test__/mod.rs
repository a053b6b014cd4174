#[cfg(test)]
mod __test__ {

  use std::sync::atomic::{AtomicUsize, Ordering};

  use smallvec::smallvec;

  use crate::attribute::{AttributeList, AttributePack, OwnedValue, Value};

  #[test]
  fn test_value_render() {
    let mut out = String::new();
    Value::I64(-42).render(&mut out);
    out.push(' ');
    Value::F64(2.5).render(&mut out);
    out.push(' ');
    Value::Str("text").render(&mut out);

    assert_eq!(out, "-42 2.5 text");
  }

  #[test]
  fn test_value_conversions() {
    assert_eq!(Value::from(42i64), Value::I64(42));
    assert_eq!(Value::from(42i32), Value::I64(42));
    assert_eq!(Value::from(2.5f64), Value::F64(2.5));
    assert_eq!(Value::from("key"), Value::Str("key"));
  }

  #[test]
  fn test_owned_view_is_zero_copy() {
    let owned = OwnedValue::String("payload".to_string());

    match (owned.view(), &owned) {
      (Value::Str(view), OwnedValue::String(storage)) => {
        assert!(std::ptr::eq(view.as_ptr(), storage.as_ptr()));
      },
      _ => panic!("expected a string view"),
    }
  }

  #[test]
  fn test_lazy_materialized_once() {
    let calls = AtomicUsize::new(0);
    let format = |out: &mut String| {
      calls.fetch_add(1, Ordering::SeqCst);
      out.push_str("deferred");
    };

    let value = Value::Lazy(&format);
    let owned = value.into_owned();

    assert_eq!(owned, OwnedValue::String("deferred".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_pack_find_respects_list_order() {
    let first: AttributeList = smallvec![("req", Value::Str("r1")), ("shared", Value::I64(1))];
    let second: AttributeList = smallvec![("shared", Value::I64(2)), ("op", Value::Str("get"))];

    let mut pack = AttributePack::new();
    pack.push(&first);
    pack.push(&second);

    assert_eq!(pack.len(), 2);
    assert_eq!(pack.find("req"), Some(Value::Str("r1")));
    assert_eq!(pack.find("op"), Some(Value::Str("get")));
    // The first pushed list wins for duplicated keys.
    assert_eq!(pack.find("shared"), Some(Value::I64(1)));
    assert_eq!(pack.find("missing"), None);
  }

  #[test]
  fn test_pack_entries_flatten_in_order() {
    let first: AttributeList = smallvec![("a", Value::I64(1))];
    let second: AttributeList = smallvec![("b", Value::I64(2)), ("c", Value::I64(3))];

    let mut pack = AttributePack::new();
    pack.push(&first);
    pack.push(&second);

    let keys: Vec<&str> = pack.entries().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_owned_value_serialization() {
    let values = vec![
      OwnedValue::I64(-123),
      OwnedValue::F64(3.14),
      OwnedValue::String("owned".to_string()),
    ];

    for value in values {
      let serialized = serde_json::to_string(&value).expect("Failed to serialize");
      let deserialized: OwnedValue =
        serde_json::from_str(&serialized).expect("Failed to deserialize");
      assert_eq!(deserialized, value);
    }
  }
}
