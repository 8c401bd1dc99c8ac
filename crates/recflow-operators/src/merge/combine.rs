//! Combine modes: by position and by a pair of fields.

use indexmap::IndexMap;

use recflow_core::path::FieldPath;
use recflow_core::record::{Record, Stream};

use super::key_text;

/// Record `i` is stream 0's record `i` overlaid with every later stream's
/// record `i`, later streams winning on key collisions.
pub(super) fn by_position(streams: &[&[Record]]) -> Stream {
    let longest = streams.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(longest);
    for i in 0..longest {
        let mut merged: Option<Record> = None;
        for s in streams {
            let Some(rec) = s.get(i) else { continue };
            match merged.as_mut() {
                Some(acc) => acc.absorb(rec),
                None => merged = Some(rec.clone()),
            }
        }
        out.extend(merged);
    }
    out
}

/// Inner join of `left` against every matching `right` record.
///
/// With `drop_right` (both sides use the same field name) the right-hand join
/// field is left out of the merged payload.
pub(super) fn by_fields(
    left: &[Record],
    right: &[Record],
    left_field: &FieldPath,
    right_field: &FieldPath,
    drop_right: bool,
) -> Stream {
    let mut lookup: IndexMap<String, Vec<&Record>> = IndexMap::new();
    for rec in right {
        if let Some(v) = right_field.resolve(&rec.json) {
            lookup.entry(key_text(v)).or_default().push(rec);
        }
    }

    let mut out = Vec::new();
    let mut unmatched = 0usize;
    for rec in left {
        let hits = left_field
            .resolve(&rec.json)
            .and_then(|v| lookup.get(&key_text(v)));
        let Some(hits) = hits else {
            unmatched += 1;
            continue;
        };
        for hit in hits {
            let mut merged = rec.clone();
            for (k, v) in &hit.json {
                if drop_right && k == right_field.as_str() {
                    continue;
                }
                merged.json.insert(k.clone(), v.clone());
            }
            for (k, v) in &hit.binary {
                merged.binary.insert(k.clone(), v.clone());
            }
            out.push(merged);
        }
    }
    if unmatched > 0 {
        tracing::debug!(unmatched, field = left_field.as_str(), "dropped records without a match");
    }
    out
}
