//! Serialized-size heuristic for records.
//!
//! Walks the value once and sums an approximation of its compact JSON length
//! without allocating. Not exact; only cheap and monotonic in content.

use serde_json::{Map, Value};

use recflow_core::record::Record;

const NULL_BYTES: usize = 4;
const BOOL_BYTES: usize = 5;
const NUMBER_BYTES: usize = 8;

pub fn estimate_value(value: &Value) -> usize {
    match value {
        Value::Null => NULL_BYTES,
        Value::Bool(_) => BOOL_BYTES,
        Value::Number(_) => NUMBER_BYTES,
        Value::String(s) => s.len() + 2,
        Value::Array(items) => {
            let inner: usize = items.iter().map(estimate_value).sum();
            2 + inner + items.len().saturating_sub(1)
        }
        Value::Object(map) => estimate_map(map),
    }
}

fn estimate_map(map: &Map<String, Value>) -> usize {
    // `"key":` per entry plus separators and braces.
    let inner: usize = map.iter().map(|(k, v)| k.len() + 3 + estimate_value(v)).sum();
    2 + inner + map.len().saturating_sub(1)
}

/// Payload estimate plus raw attachment bytes.
pub fn estimate_record(record: &Record) -> usize {
    let attachments: usize = record
        .binary
        .iter()
        .map(|(name, att)| name.len() + att.mime_type.len() + att.data.len())
        .sum();
    estimate_map(&record.json) + attachments
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn close_to_compact_json_length() {
        let v = json!({"name": "alice", "tags": ["a", "b"], "ok": true});
        let exact = serde_json::to_string(&v).unwrap().len();
        let est = estimate_value(&v);
        assert!(est.abs_diff(exact) <= 8, "estimate {est} vs exact {exact}");
    }

    #[test]
    fn grows_with_content() {
        let small = json!({"s": "x"});
        let big = json!({"s": "x".repeat(1000)});
        assert!(estimate_value(&big) > estimate_value(&small) + 900);
    }

    #[test]
    fn attachments_count() {
        let mut rec = Record::from_value(json!({"a": 1}), 0);
        let base = estimate_record(&rec);
        rec.binary.insert(
            "file".into(),
            recflow_core::record::Attachment {
                data: vec![0u8; 256],
                mime_type: "application/octet-stream".into(),
                file_name: None,
            },
        );
        assert!(estimate_record(&rec) >= base + 256);
    }
}
