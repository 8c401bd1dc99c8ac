//! Deterministic replay & provenance helpers.
//!
//! The plan hash covers the serialized `PhysicalProgram` (steps, bindings and
//! configs). With identical inputs the runtime produces identical output
//! digests; only manifest ids and timestamps differ between runs.

use std::collections::BTreeMap;

use recflow_core::hash::{hash_bytes, hash_serde, hash_stream, Hash256};
use recflow_core::manifest::RunManifest;
use recflow_core::record::Stream;
use recflow_planner::physical::PhysicalProgram;

use crate::ExecError;

pub fn hash_program(program: &PhysicalProgram) -> Result<Hash256, ExecError> {
    hash_serde(program).map_err(|e| ExecError::Hash(e.to_string()))
}

/// One digest over all named inputs, in name order.
pub fn hash_inputs(inputs: &BTreeMap<String, Stream>) -> Hash256 {
    let mut buf = Vec::with_capacity(inputs.len() * 40);
    for (name, stream) in inputs {
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&hash_stream(stream).0);
    }
    hash_bytes(&buf)
}

/// True if two runs saw the same plan and inputs and produced the same output.
pub fn same_outcome(a: &RunManifest, b: &RunManifest) -> bool {
    a.plan_hash == b.plan_hash
        && a.inputs_digest == b.inputs_digest
        && a.outputs_digest == b.outputs_digest
}
