//! Locating the collection an iteration walks over.

use serde_json::{Map, Value};

use recflow_core::path::FieldPath;

/// Nesting bound for the recursive array search.
const MAX_SEARCH_DEPTH: usize = 32;

/// Where an array was found, for logging and metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySource {
    Configured,
    /// The configured field held a mapping; its first array entry was used.
    Unwrapped,
    Searched,
}

/// Find the array to iterate in `payload`.
///
/// Order: the configured path; if that resolves to a mapping, its first
/// array-valued entry; otherwise the first top-level array, then the first
/// array found by a depth-first walk through nested mappings.
pub fn locate_array<'a>(
    payload: &'a Map<String, Value>,
    path: Option<&FieldPath>,
) -> Option<(&'a Vec<Value>, ArraySource)> {
    if let Some(path) = path {
        match path.resolve(payload) {
            Some(Value::Array(items)) => return Some((items, ArraySource::Configured)),
            Some(Value::Object(inner)) => {
                // More than one array entry is ambiguous; the first one wins.
                if let Some(items) = inner.values().find_map(Value::as_array) {
                    return Some((items, ArraySource::Unwrapped));
                }
            }
            _ => {}
        }
        tracing::debug!(field = %path, "configured array field not usable, searching payload");
    }
    search(payload, 0).map(|items| (items, ArraySource::Searched))
}

fn search(map: &Map<String, Value>, depth: usize) -> Option<&Vec<Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    map.values().find_map(Value::as_array).or_else(|| {
        map.values()
            .filter_map(Value::as_object)
            .find_map(|inner| search(inner, depth + 1))
    })
}

/// The mapping an object-properties iteration walks over. With no path the
/// whole payload is used.
pub fn locate_object<'a>(
    payload: &'a Map<String, Value>,
    path: Option<&FieldPath>,
) -> Option<&'a Map<String, Value>> {
    match path {
        None => Some(payload),
        Some(path) => path.resolve(payload).and_then(Value::as_object),
    }
}
