//! Batch aggregator: regroups a flat stream into fixed-size chunks.
//!
//! Chunking always follows input order and the last chunk may be short.
//! Each mode annotates its output with a `_batch` descriptor.

use serde_json::{json, Map, Value};

use recflow_core::options::{from_json, BatchMode, BatchProcessing};
use recflow_core::record::{Record, Stream};

use crate::traits::{Arity, OpError, Operator};

pub const BATCH_META_FIELD: &str = "_batch";

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOp {
    mode: BatchMode,
    size: usize,
    field_name: String,
}

impl BatchOp {
    pub fn new(cfg: &BatchProcessing) -> Result<Self, OpError> {
        Ok(Self {
            mode: cfg.batch_mode,
            size: cfg.size()?,
            field_name: cfg.batch_field_name.clone(),
        })
    }

    /// Build from a raw `batchProcessing`-shaped JSON object.
    pub fn from_json(raw: &Value) -> Result<Self, OpError> {
        let cfg: BatchProcessing = from_json(raw)?;
        Self::new(&cfg)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn apply(&self, records: Stream) -> Stream {
        if records.is_empty() {
            return records;
        }
        let total = records.len().div_ceil(self.size);
        let mut out = Vec::with_capacity(match self.mode {
            BatchMode::SeparateItems => records.len(),
            _ => total,
        });

        let mut it = records.into_iter().peekable();
        let mut batch_index = 0usize;
        while it.peek().is_some() {
            let chunk: Vec<Record> = it.by_ref().take(self.size).collect();
            let meta = |extra: Option<usize>| {
                let mut m = json!({
                    "batchIndex": batch_index,
                    "batchSize": chunk.len(),
                    "totalBatches": total,
                });
                if let (Some(pos), Value::Object(obj)) = (extra, &mut m) {
                    obj.insert("position".into(), json!(pos));
                }
                m
            };
            match self.mode {
                BatchMode::ArrayField => {
                    let mut json = Map::new();
                    json.insert(
                        self.field_name.clone(),
                        Value::Array(chunk.iter().map(Record::to_value).collect()),
                    );
                    json.insert(BATCH_META_FIELD.into(), meta(None));
                    out.push(fold_chunk(&chunk, json));
                }
                BatchMode::MergeObjects => {
                    // Original top-level key names are not preserved here.
                    let mut json = Map::new();
                    for (i, rec) in chunk.iter().enumerate() {
                        json.insert(format!("item_{i}"), rec.to_value());
                    }
                    json.insert(BATCH_META_FIELD.into(), meta(None));
                    out.push(fold_chunk(&chunk, json));
                }
                BatchMode::SeparateItems => {
                    let metas: Vec<Value> = (0..chunk.len()).map(|p| meta(Some(p))).collect();
                    for (mut rec, m) in chunk.into_iter().zip(metas) {
                        rec.json.insert(BATCH_META_FIELD.into(), m);
                        out.push(rec);
                    }
                }
            }
            batch_index += 1;
        }
        out
    }
}

/// One record for a whole chunk: provenance of its first member, attachments
/// of all members (later ones win on name clashes).
fn fold_chunk(chunk: &[Record], json: Map<String, Value>) -> Record {
    let index = chunk.first().map(|r| r.index).unwrap_or(0);
    let mut rec = Record::new(json, index);
    for member in chunk {
        for (name, att) in &member.binary {
            rec.binary.insert(name.clone(), att.clone());
        }
    }
    rec
}

impl Operator for BatchOp {
    fn name(&self) -> &'static str {
        "batch"
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn eval(&self, inputs: &[Stream]) -> Result<Stream, OpError> {
        let input = inputs
            .first()
            .ok_or_else(|| OpError::Config("batch expects one input stream".into()))?;
        Ok(self.apply(input.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recflow_core::record::payloads_to_stream;

    fn op(mode: BatchMode, size: i64) -> BatchOp {
        BatchOp::new(&BatchProcessing {
            enable_batching: true,
            batch_size: size,
            batch_mode: mode,
            batch_field_name: "items".into(),
        })
        .unwrap()
    }

    fn five() -> Stream {
        payloads_to_stream((0..5).map(|i| json!({ "n": i })).collect())
    }

    #[test]
    fn last_chunk_may_be_short() {
        let out = op(BatchMode::ArrayField, 2).apply(five());
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].json["items"], json!([{ "n": 4 }]));
        assert_eq!(out[2].json["_batch"]["batchSize"], 1);
        assert_eq!(out[0].json["_batch"]["totalBatches"], 3);
        assert_eq!(out[1].index, 2);
    }

    #[test]
    fn zero_size_rejected() {
        let err = BatchOp::new(&BatchProcessing {
            batch_size: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(op(BatchMode::MergeObjects, 3).apply(Vec::new()).is_empty());
    }
}
