//! Structural checks over a parsed pipeline.

use std::collections::HashSet;

use recflow_core::options::{from_json, BatchProcessing, IterationConfig, MergeConfig};
use recflow_operators::registry::Registry;

use crate::dsl::yaml::{Pipeline, StepOp};
use crate::error::PlanError;
use crate::logical::{LogicalPipeline, LogicalStep, StreamRef};

/// Resolve references and check arity and config shape. Semantic config
/// problems (zero range step, missing match key, ...) are left to the
/// operator so they surface as error records at run time.
pub fn validate(p: &Pipeline) -> Result<LogicalPipeline, PlanError> {
    if p.steps.is_empty() {
        return Err(PlanError::Empty);
    }

    let registry = Registry::default();
    let mut inputs: HashSet<&str> = HashSet::new();
    for name in &p.inputs {
        if !inputs.insert(name.as_str()) {
            return Err(PlanError::Duplicate(name.clone()));
        }
    }

    let mut defined: HashSet<&str> = HashSet::new();
    let mut steps = Vec::with_capacity(p.steps.len());
    for def in &p.steps {
        if inputs.contains(def.id.as_str()) || !defined.insert(def.id.as_str()) {
            return Err(PlanError::Duplicate(def.id.clone()));
        }

        let mut refs = Vec::new();
        for name in def.sources()? {
            // A step may only read streams defined before it.
            let r = if inputs.contains(name.as_str()) {
                StreamRef::Input(name)
            } else if defined.contains(name.as_str()) && name != def.id {
                StreamRef::Step(name)
            } else {
                return Err(PlanError::UnknownStream {
                    step: def.id.clone(),
                    name,
                });
            };
            refs.push(r);
        }

        let key = def.op.key();
        if let Some(arity) = registry.arity(key) {
            if !arity.accepts(refs.len()) {
                return Err(PlanError::Arity {
                    step: def.id.clone(),
                    op: key.to_string(),
                    expected: format!("{arity:?}"),
                    got: refs.len(),
                });
            }
        }

        check_config(def.op, &def.config).map_err(|reason| PlanError::Config {
            step: def.id.clone(),
            reason,
        })?;

        steps.push(LogicalStep {
            id: def.id.clone(),
            key: key.to_string(),
            inputs: refs,
            config: def.config.clone(),
        });
    }

    let output = match &p.output {
        Some(name) => steps
            .iter()
            .position(|s| &s.id == name)
            .ok_or_else(|| PlanError::UnknownOutput(name.clone()))?,
        None => steps.len() - 1,
    };

    Ok(LogicalPipeline {
        inputs: p.inputs.clone(),
        steps,
        output,
    })
}

fn check_config(op: StepOp, config: &serde_json::Value) -> Result<(), String> {
    let res = match op {
        StepOp::Iterate => from_json::<IterationConfig>(config).map(drop),
        StepOp::Batch => from_json::<BatchProcessing>(config).map(drop),
        StepOp::Merge => from_json::<MergeConfig>(config).map(drop),
    };
    res.map_err(|e| e.to_string())
}
