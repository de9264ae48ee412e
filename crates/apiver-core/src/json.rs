//! Order-preserving JSON AST helpers (spec §4.1).
//!
//! Every higher layer manipulates JSON through this vocabulary instead of
//! reaching into [`serde_json::Value`] directly, so that field order — an
//! observable contract of the wire format — is never accidentally disturbed
//! by a rename or delete. This requires the crate's `serde_json` dependency
//! to carry the `preserve_order` feature; without it `serde_json::Map` is a
//! `BTreeMap` and silently re-sorts keys.

use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind};

/// The JSON kind of a node. `Kind(nil)` is [`Kind::Null`], matching the
/// contract that a null/absent node behaves like an empty value rather
/// than panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Absent, or JSON `null`.
    Null,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Bool,
}

/// The JSON kind of `node`. Returns [`Kind::Null`] for `None`.
#[must_use]
pub fn kind(node: Option<&Value>) -> Kind {
    match node {
        None | Some(Value::Null) => Kind::Null,
        Some(Value::Object(_)) => Kind::Object,
        Some(Value::Array(_)) => Kind::Array,
        Some(Value::String(_)) => Kind::String,
        Some(Value::Number(_)) => Kind::Number,
        Some(Value::Bool(_)) => Kind::Bool,
    }
}

fn as_object_mut<'a>(node: &'a mut Value) -> Option<&'a mut Map<String, Value>> {
    node.as_object_mut()
}

/// Create or overwrite `name` on `node`.
///
/// Preserves the position of an existing key; a new key is appended at
/// the end. A no-op error (not a panic) if `node` is not an object.
///
/// # Errors
///
/// Returns [`ErrorKind::TypeMismatch`] if `node` is not a JSON object.
pub fn set_field(node: &mut Value, name: &str, value: Value) -> Result<(), Error> {
    let obj = as_object_mut(node)
        .ok_or_else(|| Error::new(ErrorKind::TypeMismatch, format!("set_field: {name} is not on an object")))?;
    obj.insert(name.to_string(), value);
    Ok(())
}

/// Remove `name` from `node`. Idempotent: removing an absent field, or
/// calling this on a non-object node, is a no-op.
pub fn delete_field(node: &mut Value, name: &str) {
    if let Some(obj) = node.as_object_mut() {
        obj.shift_remove(name);
    }
}

/// Read `name` from `node`, if present.
#[must_use]
pub fn get_field<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.as_object().and_then(|obj| obj.get(name))
}

/// Whether `node` is an object containing `name`.
#[must_use]
pub fn has_field(node: &Value, name: &str) -> bool {
    node.as_object().is_some_and(|obj| obj.contains_key(name))
}

/// Read `name` from `node` as a string.
///
/// # Errors
///
/// Returns [`ErrorKind::FieldNotFound`] if absent, [`ErrorKind::TypeMismatch`]
/// if present but not a string.
pub fn get_field_string<'a>(node: &'a Value, name: &str) -> Result<&'a str, Error> {
    match get_field(node, name) {
        None => Err(Error::new(ErrorKind::FieldNotFound, format!("field {name:?} not found"))),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(Error::new(ErrorKind::TypeMismatch, format!("field {name:?} is not a string"))),
    }
}

/// Read `name` from `node` as an integer.
///
/// # Errors
///
/// Returns [`ErrorKind::FieldNotFound`] if absent, [`ErrorKind::TypeMismatch`]
/// if present but not an integral number.
pub fn get_field_int(node: &Value, name: &str) -> Result<i64, Error> {
    match get_field(node, name) {
        None => Err(Error::new(ErrorKind::FieldNotFound, format!("field {name:?} not found"))),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| Error::new(ErrorKind::TypeMismatch, format!("field {name:?} is not an integer"))),
        Some(_) => Err(Error::new(ErrorKind::TypeMismatch, format!("field {name:?} is not a number"))),
    }
}

/// Read `name` from `node` as a float.
///
/// # Errors
///
/// Returns [`ErrorKind::FieldNotFound`] if absent, [`ErrorKind::TypeMismatch`]
/// if present but not a number.
pub fn get_field_float(node: &Value, name: &str) -> Result<f64, Error> {
    match get_field(node, name) {
        None => Err(Error::new(ErrorKind::FieldNotFound, format!("field {name:?} not found"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::new(ErrorKind::TypeMismatch, format!("field {name:?} is not a number"))),
        Some(_) => Err(Error::new(ErrorKind::TypeMismatch, format!("field {name:?} is not a number"))),
    }
}

/// Rename `old` to `new` on `node`.
///
/// A no-op if `old` is absent or `old == new`. Preserves the insertion
/// slot of `old` when feasible; otherwise appends `new` at the end.
/// Renaming onto an existing `new` overwrites it.
pub fn rename_field(node: &mut Value, old: &str, new: &str) {
    if old == new {
        return;
    }
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if !obj.contains_key(old) {
        return;
    }
    if obj.contains_key(new) {
        // Renaming onto an existing key: `new`'s slot and the rest of the
        // map are untouched, only its value changes.
        let value = obj.shift_remove(old).expect("checked above");
        obj.insert(new.to_string(), value);
        return;
    }
    // `new` is a fresh key: rebuild the map in place so `new` lands in
    // `old`'s slot instead of at the end.
    let mut rebuilt = Map::new();
    for (k, v) in std::mem::take(obj) {
        if k == old {
            rebuilt.insert(new.to_string(), v);
        } else {
            rebuilt.insert(k, v);
        }
    }
    *obj = rebuilt;
}

/// Deep-copy `name` from `src` to `dst`. A no-op if `name` is absent on `src`.
pub fn copy_field(src: &Value, dst: &mut Value, name: &str) {
    let Some(value) = get_field(src, name).cloned() else {
        return;
    };
    let _ = set_field(dst, name, value);
}

/// The length of `node` as an array.
///
/// # Errors
///
/// Returns [`ErrorKind::NotAnArray`] if `node` is not an array.
pub fn array_len(node: &Value) -> Result<usize, Error> {
    node.as_array()
        .map(Vec::len)
        .ok_or_else(|| Error::new(ErrorKind::NotAnArray, "not an array"))
}

/// The `i`th element of `node`.
///
/// # Errors
///
/// Returns [`ErrorKind::NotAnArray`] if `node` is not an array, or
/// [`ErrorKind::OutOfBounds`] if `i >= len`.
pub fn array_item(node: &Value, i: usize) -> Result<&Value, Error> {
    let arr = node.as_array().ok_or_else(|| Error::new(ErrorKind::NotAnArray, "not an array"))?;
    arr.get(i)
        .ok_or_else(|| Error::new(ErrorKind::OutOfBounds, format!("index {i} out of bounds (len {})", arr.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn set_field_preserves_order_of_existing_keys() {
        let mut node = json!({"a": 1, "b": 2, "c": 3});
        set_field(&mut node, "b", json!(20)).unwrap();
        let keys: Vec<_> = node.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn set_field_appends_new_key_at_end() {
        let mut node = json!({"a": 1, "b": 2});
        set_field(&mut node, "z", json!(9)).unwrap();
        let keys: Vec<_> = node.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b", "z"]);
    }

    #[test]
    fn delete_field_is_idempotent() {
        let mut node = json!({"a": 1});
        delete_field(&mut node, "a");
        delete_field(&mut node, "a");
        assert!(!has_field(&node, "a"));
    }

    #[test]
    fn delete_field_on_nil_is_noop() {
        let mut node = Value::Null;
        delete_field(&mut node, "a");
        assert_eq!(node, Value::Null);
    }

    #[test]
    fn rename_preserves_the_old_keys_slot() {
        let mut node = json!({"a": 1, "name": "John", "c": 3});
        rename_field(&mut node, "name", "full_name");
        let keys: Vec<_> = node.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "full_name", "c"]);
        assert_eq!(node["full_name"], json!("John"));
    }

    #[test]
    fn rename_absent_field_is_noop() {
        let mut node = json!({"a": 1});
        rename_field(&mut node, "missing", "whatever");
        assert_eq!(node, json!({"a": 1}));
    }

    #[test]
    fn rename_to_same_name_is_noop() {
        let mut node = json!({"a": 1});
        rename_field(&mut node, "a", "a");
        assert_eq!(node, json!({"a": 1}));
    }

    #[test]
    fn rename_onto_existing_name_overwrites() {
        let mut node = json!({"a": 1, "b": 2});
        rename_field(&mut node, "a", "b");
        assert_eq!(node, json!({"b": 1}));
    }

    #[test]
    fn rename_null_valued_field_still_moves_key() {
        let mut node = json!({"a": null});
        rename_field(&mut node, "a", "b");
        assert_eq!(node, json!({"b": null}));
    }

    #[test]
    fn round_trip_rename_is_verbatim() {
        let original = json!({"id": 1, "x": "value", "other": true});
        let mut node = original.clone();
        rename_field(&mut node, "x", "y");
        rename_field(&mut node, "y", "x");
        assert_eq!(node, original);
        let keys: Vec<_> = node.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "x", "other"], "round trip must also restore key order, not just equality");
    }

    #[test]
    fn copy_field_missing_source_is_noop() {
        let src = json!({});
        let mut dst = json!({"a": 1});
        copy_field(&src, &mut dst, "missing");
        assert_eq!(dst, json!({"a": 1}));
    }

    #[test]
    fn array_item_out_of_bounds() {
        let node = json!([1, 2, 3]);
        assert_eq!(array_item(&node, 5).unwrap_err().kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn array_item_not_an_array() {
        let node = json!({"a": 1});
        assert_eq!(array_item(&node, 0).unwrap_err().kind(), ErrorKind::NotAnArray);
    }

    #[test]
    fn kind_of_absent_is_null() {
        assert_eq!(kind(None), Kind::Null);
    }

    #[test]
    fn get_field_typed_errors() {
        let node = json!({"s": "x", "n": 1});
        assert!(get_field_string(&node, "n").is_err());
        assert_eq!(get_field_int(&node, "missing").unwrap_err().kind(), ErrorKind::FieldNotFound);
    }
}
