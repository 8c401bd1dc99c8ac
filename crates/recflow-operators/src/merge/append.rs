use recflow_core::record::{Record, Stream};

/// Concatenate in stream order, keeping each stream's relative order.
pub(super) fn append(streams: &[&[Record]]) -> Stream {
    let total = streams.iter().map(|s| s.len()).sum();
    let mut out = Vec::with_capacity(total);
    for s in streams {
        out.extend(s.iter().cloned());
    }
    out
}
