//! Merge operator: combines 2..=10 streams into one.
//!
//! The configuration is checked once in [`MergeOp::new`]; `eval` only
//! rejects calls with fewer than two supplied streams.

mod append;
mod by_key;
mod combine;
mod multiplex;

use serde_json::Value;

use recflow_core::options::{
    from_json, CombineBy, JoinMode, MergeConfig, MergeMode, MAX_MERGE_INPUTS, MIN_MERGE_INPUTS,
};
use recflow_core::path::FieldPath;
use recflow_core::record::{Record, Stream};

use crate::traits::{Arity, OpError, Operator};

#[derive(Debug, Clone, PartialEq)]
enum Plan {
    Append,
    ByPosition,
    ByFields {
        left: FieldPath,
        right: FieldPath,
        drop_right: bool,
    },
    ByKey {
        key: FieldPath,
        join: JoinMode,
    },
    Multiplex {
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOp {
    mode: MergeMode,
    number_inputs: usize,
    plan: Plan,
}

fn required_path(value: Option<&str>, name: &str) -> Result<FieldPath, OpError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(FieldPath::parse(v)?),
        _ => Err(OpError::Config(format!("{name} is required"))),
    }
}

impl MergeOp {
    pub fn new(cfg: &MergeConfig) -> Result<Self, OpError> {
        if !(MIN_MERGE_INPUTS..=MAX_MERGE_INPUTS).contains(&cfg.number_inputs) {
            return Err(OpError::Config(format!(
                "numberInputs must be between {MIN_MERGE_INPUTS} and {MAX_MERGE_INPUTS}, got {}",
                cfg.number_inputs
            )));
        }

        let plan = match (cfg.mode, cfg.combine_by) {
            (MergeMode::Append, _) => Plan::Append,
            (MergeMode::Combine, CombineBy::Position) => Plan::ByPosition,
            (MergeMode::Combine, CombineBy::Fields) => {
                let f1 = cfg.merge_fields.field1.as_deref();
                let f2 = cfg.merge_fields.field2.as_deref();
                Plan::ByFields {
                    left: required_path(f1, "mergeFields.field1")?,
                    right: required_path(f2, "mergeFields.field2")?,
                    drop_right: f1 == f2,
                }
            }
            (MergeMode::MergeByKey, _) => Plan::ByKey {
                key: required_path(cfg.merge_by_key.match_key.as_deref(), "mergeByKey.matchKey")?,
                join: cfg.merge_by_key.join_mode,
            },
            (MergeMode::Multiplex, _) => Plan::Multiplex {
                prefix: cfg
                    .multiplex_options
                    .prefix
                    .clone()
                    .filter(|p| !p.is_empty()),
            },
        };

        Ok(Self {
            mode: cfg.mode,
            number_inputs: cfg.number_inputs,
            plan,
        })
    }

    pub fn from_json(raw: &Value) -> Result<Self, OpError> {
        let cfg: MergeConfig = from_json(raw)?;
        Self::new(&cfg)
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn number_inputs(&self) -> usize {
        self.number_inputs
    }

    /// Merge `inputs`. Streams beyond `numberInputs` are ignored and missing
    /// trailing streams count as empty.
    pub fn merge(&self, inputs: &[Stream]) -> Result<Stream, OpError> {
        if inputs.len() < MIN_MERGE_INPUTS {
            return Err(OpError::Config(format!(
                "merge needs at least {MIN_MERGE_INPUTS} input streams, got {}",
                inputs.len()
            )));
        }
        let streams: Vec<&[Record]> = (0..self.number_inputs)
            .map(|k| inputs.get(k).map(Vec::as_slice).unwrap_or(&[]))
            .collect();

        let out = match &self.plan {
            Plan::Append => append::append(&streams),
            Plan::ByPosition => combine::by_position(&streams),
            Plan::ByFields {
                left,
                right,
                drop_right,
            } => combine::by_fields(streams[0], streams[1], left, right, *drop_right),
            Plan::ByKey { key, join } => by_key::merge_by_key(&streams, key, *join),
            Plan::Multiplex { prefix } => multiplex::multiplex(&streams, prefix.as_deref())?,
        };

        tracing::debug!(
            mode = self.mode.as_str(),
            inputs = self.number_inputs,
            records_out = out.len(),
            "merge finished"
        );
        Ok(out)
    }
}

/// Canonical text used for key equality. `1` and `"1"` stay distinct.
pub(crate) fn key_text(value: &Value) -> String {
    value.to_string()
}

impl Operator for MergeOp {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn arity(&self) -> Arity {
        Arity::Nary {
            min: MIN_MERGE_INPUTS,
            max: MAX_MERGE_INPUTS,
        }
    }

    fn eval(&self, inputs: &[Stream]) -> Result<Stream, OpError> {
        self.merge(inputs)
    }
}
