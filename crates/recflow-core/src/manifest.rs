//! Deterministic run manifest for audit/replay.
//!
//! The engine emits a manifest after each pipeline run. Identical inputs and
//! configuration yield identical digests; only the id and timestamps differ.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;
use crate::id::OpId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

/// Per-step execution counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub op: OpId,
    pub step: String,
    pub operator: String,
    pub records_in: usize,
    pub records_out: usize,
    /// Set when the operator degraded to an error record.
    pub errored: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the lowered pipeline (step bindings and configs).
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Digest over all named input streams (sorted by name).
    pub inputs_digest: Option<Hash256>,

    /// Digest of the output stream.
    pub outputs_digest: Option<Hash256>,

    pub steps: Vec<StepReport>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            inputs_digest: None,
            outputs_digest: None,
            steps: Vec::new(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, outputs_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.outputs_digest = outputs_digest;
        self
    }
}
