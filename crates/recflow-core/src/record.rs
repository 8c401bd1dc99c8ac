//! The record model flowing between pipeline stages.
//!
//! Payloads are `serde_json` maps built with `preserve_order`, so iteration
//! order is insertion order everywhere a "first encountered" rule applies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque named binary blob carried alongside a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Structured payload.
    pub json: Map<String, Value>,
    /// Named attachments; never interpreted by operators.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, Attachment>,
    /// Position of the originating record in its source stream.
    #[serde(default)]
    pub index: usize,
}

/// Ordered, fully materialized sequence of records.
pub type Stream = Vec<Record>;

impl Record {
    pub fn new(json: Map<String, Value>, index: usize) -> Self {
        Self {
            json,
            binary: BTreeMap::new(),
            index,
        }
    }

    /// Build a record from any JSON value. Non-object values are wrapped
    /// under a `data` key so the payload is always a mapping.
    pub fn from_value(value: Value, index: usize) -> Self {
        let json = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self::new(json, index)
    }

    /// Same provenance and attachments, new payload.
    pub fn derive(&self, json: Map<String, Value>) -> Self {
        Self {
            json,
            binary: self.binary.clone(),
            index: self.index,
        }
    }

    pub fn with_binary(mut self, binary: BTreeMap<String, Attachment>) -> Self {
        self.binary = binary;
        self
    }

    /// Overlay `other`'s payload keys and attachments onto this record.
    /// Keys already present are overwritten.
    pub fn absorb(&mut self, other: &Record) {
        for (k, v) in &other.json {
            self.json.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.binary {
            self.binary.insert(k.clone(), v.clone());
        }
    }

    /// Payload as an owned JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.json.clone())
    }

    /// Single-record stream carrying an `error` payload.
    pub fn error(message: impl Into<String>) -> Self {
        let mut json = Map::new();
        json.insert("error".to_string(), Value::String(message.into()));
        Self::new(json, 0)
    }

    pub fn is_error(&self) -> bool {
        self.json.contains_key("error")
    }
}

/// Materialize a stream from payload values, assigning positional indices.
pub fn payloads_to_stream(values: Vec<Value>) -> Stream {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Record::from_value(v, i))
        .collect()
}

/// Project a stream back to its payloads.
pub fn stream_to_payloads(stream: &[Record]) -> Vec<Value> {
    stream.iter().map(Record::to_value).collect()
}

/// True for values a "skip empty" option drops: null, `""`, `[]`, `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
