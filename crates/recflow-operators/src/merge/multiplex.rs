//! Cartesian product across the non-empty input streams.

use recflow_core::record::{Record, Stream};

use crate::traits::OpError;

/// Every combination of one record per non-empty stream, last stream varying
/// fastest. Empty streams are left out of the product instead of zeroing it.
pub(super) fn multiplex(streams: &[&[Record]], prefix: Option<&str>) -> Result<Stream, OpError> {
    let parts: Vec<(usize, &[Record])> = streams
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .map(|(k, s)| (k, *s))
        .collect();
    if parts.is_empty() {
        return Ok(Vec::new());
    }
    if parts.len() < streams.len() {
        tracing::debug!(
            excluded = streams.len() - parts.len(),
            "empty streams left out of multiplex product"
        );
    }

    let total = parts
        .iter()
        .try_fold(1usize, |acc, (_, s)| acc.checked_mul(s.len()))
        .ok_or_else(|| OpError::Exec("multiplex product overflows usize".into()))?;

    let mut out: Stream = Vec::new();
    out.try_reserve_exact(total).map_err(|e| {
        OpError::Exec(format!("multiplex product of {total} records cannot be allocated: {e}"))
    })?;
    let mut cursor = vec![0usize; parts.len()];
    loop {
        out.push(combine(&parts, &cursor, prefix));

        // Odometer step.
        let mut pos = parts.len();
        loop {
            if pos == 0 {
                return Ok(out);
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < parts[pos].1.len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}

fn combine(parts: &[(usize, &[Record])], cursor: &[usize], prefix: Option<&str>) -> Record {
    let (_, first) = parts[0];
    let mut merged = first[cursor[0]].clone();
    for (&(k, stream), &i) in parts.iter().zip(cursor).skip(1) {
        let rec = &stream[i];
        for (key, v) in &rec.json {
            let name = match prefix {
                Some(p) => format!("{p}{}_{key}", k + 1),
                None if merged.json.contains_key(key) => format!("{key}_{}", k + 1),
                None => key.clone(),
            };
            merged.json.insert(name, v.clone());
        }
        for (name, att) in &rec.binary {
            merged.binary.insert(name.clone(), att.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use recflow_core::record::{payloads_to_stream, stream_to_payloads};
    use serde_json::json;

    #[test]
    fn product_covers_every_pair_once() {
        let a = payloads_to_stream(vec![json!({"a": 0}), json!({"a": 1})]);
        let b = payloads_to_stream(vec![json!({"b": 0}), json!({"b": 1}), json!({"b": 2})]);
        let out = multiplex(&[&a, &b], None).unwrap();
        assert_eq!(out.len(), 6);
        let mut pairs: Vec<(i64, i64)> = out
            .iter()
            .map(|r| (r.json["a"].as_i64().unwrap(), r.json["b"].as_i64().unwrap()))
            .collect();
        assert_eq!(pairs[..3], [(0, 0), (0, 1), (0, 2)]);
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn collisions_get_stream_suffix() {
        let a = payloads_to_stream(vec![json!({"id": 1, "x": "a"})]);
        let b = payloads_to_stream(vec![json!({"id": 2, "y": "b"})]);
        let out = multiplex(&[&a, &b], None).unwrap();
        assert_eq!(
            stream_to_payloads(&out),
            vec![json!({"id": 1, "x": "a", "id_2": 2, "y": "b"})]
        );
    }

    #[test]
    fn prefix_applies_to_every_later_key() {
        let a = payloads_to_stream(vec![json!({"id": 1})]);
        let b = payloads_to_stream(vec![json!({"id": 2, "y": "b"})]);
        let out = multiplex(&[&a, &b], Some("in")).unwrap();
        assert_eq!(
            stream_to_payloads(&out),
            vec![json!({"id": 1, "in2_id": 2, "in2_y": "b"})]
        );
    }

    #[test]
    fn empty_streams_are_excluded() {
        let a = payloads_to_stream(vec![json!({"a": 1}), json!({"a": 2})]);
        let empty: Vec<Record> = Vec::new();
        let c = payloads_to_stream(vec![json!({"c": 1})]);
        let out = multiplex(&[&a, &empty, &c], None).unwrap();
        assert_eq!(out.len(), 2);
        assert!(multiplex(&[&empty, &empty], None).unwrap().is_empty());
    }

    #[test]
    fn unallocatable_product_is_an_error() {
        // 50_000^4 records fit in usize but not in memory.
        let s = payloads_to_stream((0..50_000).map(|i| json!({ "n": i })).collect());
        let err = multiplex(&[&s, &s, &s, &s], None).err().unwrap();
        assert_eq!(err.kind(), "internal");
    }
}
