//! N-way key join, folding one stream at a time into the accumulator.

use std::collections::HashSet;

use indexmap::IndexMap;

use recflow_core::options::JoinMode;
use recflow_core::path::FieldPath;
use recflow_core::record::{Record, Stream};

use super::key_text;

/// Single-valued lookup: the last record per key wins but keeps the
/// position of the first one.
fn build_lookup<'a>(stream: &'a [Record], key: &FieldPath) -> IndexMap<String, &'a Record> {
    let mut lookup = IndexMap::with_capacity(stream.len());
    let mut duplicates = 0usize;
    for rec in stream {
        if let Some(v) = key.resolve(&rec.json) {
            if lookup.insert(key_text(v), rec).is_some() {
                duplicates += 1;
            }
        }
    }
    if duplicates > 0 {
        tracing::debug!(duplicates, key = key.as_str(), "duplicate keys in folded stream, last record wins");
    }
    lookup
}

pub(super) fn merge_by_key(streams: &[&[Record]], key: &FieldPath, join: JoinMode) -> Stream {
    let Some((first, rest)) = streams.split_first() else {
        return Vec::new();
    };
    let mut acc: Stream = first.to_vec();

    for next in rest {
        let lookup = build_lookup(next, key);
        let mut seen: HashSet<String> = HashSet::new();
        let mut folded = Vec::with_capacity(acc.len());

        for mut rec in acc {
            let k = key.resolve(&rec.json).map(key_text);
            let hit = k.as_ref().and_then(|k| lookup.get(k));
            match hit {
                Some(hit) => rec.absorb(hit),
                None if join == JoinMode::Inner => continue,
                None => {}
            }
            if let Some(k) = k {
                seen.insert(k);
            }
            folded.push(rec);
        }

        if join == JoinMode::Outer {
            for (k, rec) in &lookup {
                if !seen.contains(k) {
                    folded.push((*rec).clone());
                }
            }
        }
        acc = folded;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use recflow_core::record::{payloads_to_stream, stream_to_payloads};
    use serde_json::{json, Value};

    fn run(a: Vec<Value>, b: Vec<Value>, join: JoinMode) -> Vec<Value> {
        let a = payloads_to_stream(a);
        let b = payloads_to_stream(b);
        let key = FieldPath::parse("id").unwrap();
        stream_to_payloads(&merge_by_key(&[&a, &b], &key, join))
    }

    #[test]
    fn inner_keeps_only_matches() {
        let out = run(
            vec![json!({"id": 1, "a": 1}), json!({"id": 2, "a": 2}), json!({"a": 3})],
            vec![json!({"id": 2, "b": 2})],
            JoinMode::Inner,
        );
        assert_eq!(out, vec![json!({"id": 2, "a": 2, "b": 2})]);
    }

    #[test]
    fn left_keeps_unmatched_unchanged() {
        let out = run(
            vec![json!({"id": 1, "a": 1}), json!({"a": 3})],
            vec![json!({"id": 1, "b": 1})],
            JoinMode::Left,
        );
        assert_eq!(out, vec![json!({"id": 1, "a": 1, "b": 1}), json!({"a": 3})]);
    }

    #[test]
    fn outer_appends_new_keys_after_fold() {
        let out = run(
            vec![json!({"id": 1})],
            vec![json!({"id": 9, "b": 9}), json!({"id": 1, "b": 1}), json!({"b": 0})],
            JoinMode::Outer,
        );
        assert_eq!(out, vec![json!({"id": 1, "b": 1}), json!({"id": 9, "b": 9})]);
    }

    #[test]
    fn duplicate_lookup_keys_last_wins() {
        let out = run(
            vec![json!({"id": 1})],
            vec![json!({"id": 1, "v": "first"}), json!({"id": 1, "v": "last"})],
            JoinMode::Inner,
        );
        assert_eq!(out, vec![json!({"id": 1, "v": "last"})]);
    }
}
