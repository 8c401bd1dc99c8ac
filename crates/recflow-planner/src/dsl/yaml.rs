//! YAML pipeline surface.
//!
//! Example:
//! ```yaml
//! inputs: [orders, customers]
//! steps:
//!   - id: lines
//!     op: iterate
//!     input: orders
//!     config: { iterationMode: arrayField, arrayField: lines, includeOriginalData: true }
//!   - id: joined
//!     op: merge
//!     inputs: [lines, customers]
//!     config: { mode: mergeByKey, mergeByKey: { matchKey: customerId, joinMode: left } }
//! output: joined
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub inputs: Vec<String>,
    pub steps: Vec<StepDef>,
    /// Step whose stream is the pipeline result; defaults to the last step.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOp {
    Iterate,
    Batch,
    Merge,
}

impl StepOp {
    /// Registry key.
    pub fn key(self) -> &'static str {
        match self {
            StepOp::Iterate => "iterate",
            StepOp::Batch => "batch",
            StepOp::Merge => "merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
    pub id: String,
    pub op: StepOp,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub inputs: Option<Vec<String>>,
    /// Operator config, camelCase keys as documented per operator.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl StepDef {
    /// Referenced stream names, in order.
    pub fn sources(&self) -> Result<Vec<String>, PlanError> {
        match (&self.input, &self.inputs) {
            (Some(_), Some(_)) => Err(PlanError::AmbiguousInputs {
                step: self.id.clone(),
            }),
            (Some(one), None) => Ok(vec![one.clone()]),
            (None, Some(many)) => Ok(many.clone()),
            (None, None) => Ok(Vec::new()),
        }
    }
}

pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<Pipeline, PlanError> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_and_configs() {
        let p = parse_yaml_pipeline(
            r#"
inputs: [a, b]
steps:
  - id: m
    op: merge
    inputs: [a, b]
    config: { mode: append }
  - id: it
    op: iterate
    input: m
"#,
        )
        .unwrap();
        assert_eq!(p.inputs, vec!["a", "b"]);
        assert_eq!(p.steps[0].op, StepOp::Merge);
        assert_eq!(p.steps[0].config["mode"], "append");
        assert!(p.steps[1].config.is_null());
        assert_eq!(p.steps[1].sources().unwrap(), vec!["m"]);
        assert_eq!(p.output, None);
    }

    #[test]
    fn unknown_op_is_a_yaml_error() {
        let err = parse_yaml_pipeline("steps: [ { id: x, op: sort } ]").unwrap_err();
        assert!(matches!(err, PlanError::Yaml(_)));
    }
}
