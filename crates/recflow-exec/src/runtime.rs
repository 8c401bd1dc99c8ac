//! Runtime: execute a `PhysicalProgram` in step order and emit a RunManifest.
//!
//! - Instantiates operators via `recflow-operators::registry`.
//! - Named inputs are materialized streams supplied by the caller.
//! - Steps run sequentially; each sees fully materialized inputs.
//! - Operator failures, including config errors found while instantiating,
//!   become a single error record for that step.

use std::collections::{BTreeMap, HashMap};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use recflow_core::config::EngineConfig;
use recflow_core::hash::hash_stream;
use recflow_core::manifest::{RunManifest, StepReport};
use recflow_core::record::Stream;

use recflow_operators::registry::Registry;
use recflow_operators::traits::{error_record, invoke, Invocation};

use recflow_planner::logical::StreamRef;
use recflow_planner::physical::PhysicalProgram;

use crate::{metrics, replay};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("missing input stream '{0}'")]
    MissingInput(String),
    #[error("invalid program: {0}")]
    Invalid(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

/// Result stream of the program's output step plus the run manifest.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stream: Stream,
    pub manifest: RunManifest,
}

/// Engine owns the engine defaults and the operator registry.
pub struct Engine {
    registry: Registry,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            registry: Registry::new(cfg),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.registry.engine()
    }

    /// Execute `program` over named input streams.
    pub fn run(
        &self,
        program: &PhysicalProgram,
        inputs: BTreeMap<String, Stream>,
    ) -> Result<RunOutput, ExecError> {
        for name in &program.inputs {
            if !inputs.contains_key(name) {
                return Err(ExecError::MissingInput(name.clone()));
            }
        }
        for name in inputs.keys() {
            if !program.inputs.contains(name) {
                tracing::debug!(input = %name, "ignoring input not used by the pipeline");
            }
        }

        let plan_hash = replay::hash_program(program)?;
        let mut manifest = RunManifest::new(plan_hash, now_millis());
        manifest.inputs_digest = Some(replay::hash_inputs(&inputs));

        // Step name → produced stream.
        let mut results: HashMap<&str, Stream> = HashMap::with_capacity(program.steps.len());

        for step in &program.steps {
            let binding = program.binding(step.op).ok_or_else(|| {
                ExecError::Invalid(format!("no operator bound for {}", step.op))
            })?;

            let mut streams: Vec<Stream> = Vec::with_capacity(step.inputs.len());
            for src in &step.inputs {
                let s = match src {
                    StreamRef::Input(n) => inputs.get(n),
                    StreamRef::Step(n) => results.get(n.as_str()),
                };
                let s = s.ok_or_else(|| {
                    ExecError::Invalid(format!("step '{}' reads undefined stream '{}'", step.name, src.name()))
                })?;
                streams.push(s.clone());
            }
            let records_in = streams.iter().map(Vec::len).sum();

            let started = Instant::now();
            let out = match self.registry.make(&binding.key, &binding.config) {
                Ok(op) => invoke(op.as_ref(), &streams),
                Err(e) => {
                    tracing::warn!(step = %step.name, operator = %binding.key, error = %e, "operator config rejected");
                    Invocation {
                        records: vec![error_record(&binding.key, &e)],
                        degraded: true,
                    }
                }
            };

            let report = StepReport {
                op: step.op,
                step: step.name.clone(),
                operator: binding.key.clone(),
                records_in,
                records_out: out.records.len(),
                errored: out.degraded,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            metrics::emit_step(&report);
            manifest.steps.push(report);
            results.insert(step.name.as_str(), out.records);
        }

        let output_name = program
            .steps
            .iter()
            .find(|s| s.op == program.output)
            .map(|s| s.name.as_str())
            .ok_or_else(|| ExecError::Invalid(format!("output {} is not a step", program.output)))?;
        let stream = results
            .remove(output_name)
            .ok_or_else(|| ExecError::Invalid(format!("output step '{output_name}' produced nothing")))?;

        let manifest = manifest.finish(now_millis(), Some(hash_stream(&stream)));
        metrics::emit_run(&manifest);
        Ok(RunOutput { stream, manifest })
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
