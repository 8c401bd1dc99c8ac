//! Stable hashing helpers for pipelines, streams and manifests.

use blake3::Hasher;
use serde::Serialize;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    let out = h.finalize();
    Hash256(out.into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v).map_err(|e| crate::error::Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

/// Digest of a record stream: payload JSON, attachments and provenance index
/// of every record, in order.
pub fn hash_stream(records: &[Record]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(&(records.len() as u64).to_le_bytes());
    for rec in records {
        h.update(&(rec.index as u64).to_le_bytes());
        // Map serialization cannot fail: keys are strings and values are JSON.
        let json = serde_json::to_vec(&rec.json).unwrap_or_default();
        h.update(&(json.len() as u64).to_le_bytes());
        h.update(&json);
        for (name, att) in &rec.binary {
            h.update(name.as_bytes());
            h.update(att.mime_type.as_bytes());
            h.update(&att.data);
        }
    }
    Hash256(h.finalize().into())
}
