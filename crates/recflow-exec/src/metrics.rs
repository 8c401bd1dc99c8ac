//! Metrics hooks.
//!
//! Step counters are emitted as tracing events; wire a subscriber in the
//! binary layer to collect them.

use recflow_core::manifest::{RunManifest, StepReport};

pub fn emit_step(report: &StepReport) {
    tracing::trace!(
        op = %report.op,
        step = %report.step,
        operator = %report.operator,
        records_in = report.records_in,
        records_out = report.records_out,
        errored = report.errored,
        elapsed_ms = report.elapsed_ms,
        "executed step"
    );
}

pub fn emit_run(manifest: &RunManifest) {
    let errored = manifest.steps.iter().filter(|s| s.errored).count();
    tracing::debug!(
        manifest = %manifest.id.0,
        plan = %manifest.plan_hash,
        steps = manifest.steps.len(),
        errored,
        elapsed_ms = manifest.finished_ms.saturating_sub(manifest.started_ms),
        "run finished"
    );
}
