//! Physical program: ordered steps plus operator bindings.
//!
//! The exec runtime combines this with its operator registry to create
//! concrete operator instances for each `OpId`.

use std::collections::BTreeMap;

use recflow_core::id::OpId;
use serde::{Deserialize, Serialize};

use crate::logical::StreamRef;

/// What the exec needs to instantiate an operator: a registry key and the
/// raw JSON config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorBinding {
    pub key: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalStep {
    pub op: OpId,
    /// Step id from the pipeline; names the stream this step produces.
    pub name: String,
    pub inputs: Vec<StreamRef>,
}

/// Steps in execution order. `bindings` is a BTreeMap so hashing and
/// manifests see a deterministic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProgram {
    pub inputs: Vec<String>,
    pub steps: Vec<PhysicalStep>,
    pub bindings: BTreeMap<OpId, OperatorBinding>,
    pub output: OpId,
}

impl PhysicalProgram {
    pub fn binding(&self, op: OpId) -> Option<&OperatorBinding> {
        self.bindings.get(&op)
    }

    /// One line per step, for `explain`.
    pub fn describe(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| {
                let key = self.binding(s.op).map(|b| b.key.as_str()).unwrap_or("?");
                let srcs: Vec<&str> = s.inputs.iter().map(StreamRef::name).collect();
                let mark = if s.op == self.output { " (output)" } else { "" };
                format!("{} {} <- {} [{}]{}", s.op, s.name, srcs.join(", "), key, mark)
            })
            .collect()
    }
}
