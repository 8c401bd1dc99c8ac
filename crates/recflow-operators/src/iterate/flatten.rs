//! Collapse a nested object into one level of identifier-safe keys.
//!
//! Nested keys are joined with `_`. Objects below `max_depth` levels are kept
//! as values, arrays are never descended into. Keys in `reserved` are taken
//! by fields the caller writes afterwards, so colliding element keys get a
//! numeric suffix instead of being overwritten.

use serde_json::{Map, Value};

use recflow_core::keywords::{sanitize_identifier, KeywordTable};

const SEPARATOR: &str = "_";

pub fn flatten_object(
    obj: &Map<String, Value>,
    max_depth: usize,
    table: &KeywordTable,
    reserved: &[&str],
) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, None, obj, 1, max_depth, table, reserved);
    out
}

fn flatten_into(
    out: &mut Map<String, Value>,
    prefix: Option<&str>,
    obj: &Map<String, Value>,
    depth: usize,
    max_depth: usize,
    table: &KeywordTable,
    reserved: &[&str],
) {
    for (key, value) in obj {
        let joined = match prefix {
            Some(p) => format!("{p}{SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if depth < max_depth && !inner.is_empty() => {
                flatten_into(out, Some(&joined), inner, depth + 1, max_depth, table, reserved);
            }
            _ => insert_unique(out, sanitize_identifier(&joined, table), value.clone(), reserved),
        }
    }
}

/// Later duplicates get `_2`, `_3`, ... in encounter order.
fn insert_unique(out: &mut Map<String, Value>, key: String, value: Value, reserved: &[&str]) {
    if !taken(out, reserved, &key) {
        out.insert(key, value);
        return;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{key}_{n}");
        if !taken(out, reserved, &candidate) {
            out.insert(candidate, value);
            return;
        }
        n += 1;
    }
}

fn taken(out: &Map<String, Value>, reserved: &[&str], key: &str) -> bool {
    out.contains_key(key) || reserved.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recflow_core::keywords::KeywordTarget;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn joins_nested_keys() {
        let flat = flatten_object(
            &obj(json!({"id": 1, "address": {"city": "Oslo", "geo": {"lat": 1.5}}})),
            3,
            &KeywordTable::default(),
            &[],
        );
        assert_eq!(
            Value::Object(flat),
            json!({"id": 1, "address_city": "Oslo", "address_geo_lat": 1.5})
        );
    }

    #[test]
    fn stops_at_depth() {
        let flat = flatten_object(
            &obj(json!({"a": {"b": {"c": {"d": 1}}}})),
            3,
            &KeywordTable::default(),
            &[],
        );
        assert_eq!(Value::Object(flat), json!({"a_b_c": {"d": 1}}));
    }

    #[test]
    fn renames_reserved_and_dedupes() {
        let flat = flatten_object(
            &obj(json!({"from": "x", "class": {"name": "y"}, "a b": 1, "a_b": 2})),
            3,
            &KeywordTable::for_target(KeywordTarget::Common),
            &[],
        );
        assert_eq!(
            Value::Object(flat),
            json!({"from_field": "x", "class_name": "y", "a_b": 1, "a_b_2": 2})
        );
    }

    #[test]
    fn arrays_and_empty_objects_kept() {
        let flat = flatten_object(
            &obj(json!({"tags": [{"a": 1}], "meta": {}})),
            3,
            &KeywordTable::default(),
            &[],
        );
        assert_eq!(Value::Object(flat), json!({"tags": [{"a": 1}], "meta": {}}));
    }

    #[test]
    fn reserved_keys_are_suffixed() {
        let flat = flatten_object(
            &obj(json!({"index": 42, "name": "a"})),
            3,
            &KeywordTable::default(),
            &["index"],
        );
        assert_eq!(
            Value::Object(flat),
            json!({"index_2": 42, "name": "a"})
        );
    }
}
