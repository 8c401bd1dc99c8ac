//! Operator trait, error taxonomy and the degrade boundary.
//!
//! The exec runtime instantiates operators through the `Registry` and calls
//! [`invoke`] once per pipeline step with the step's input streams.

use serde_json::{Map, Value};
use thiserror::Error;

use recflow_core::record::{Record, Stream};

#[derive(Debug, Error)]
pub enum OpError {
    /// Missing or invalid configuration, too few inputs, zero step, ...
    #[error("configuration error: {0}")]
    Config(String),

    #[error("execution error: {0}")]
    Exec(String),
}

impl OpError {
    pub fn kind(&self) -> &'static str {
        match self {
            OpError::Config(_) => "config",
            OpError::Exec(_) => "internal",
        }
    }
}

impl From<recflow_core::error::Error> for OpError {
    fn from(e: recflow_core::error::Error) -> Self {
        match e {
            recflow_core::error::Error::Invariant(msg) => OpError::Exec(msg),
            other => OpError::Config(other.to_string()),
        }
    }
}

impl From<recflow_mem::error::Error> for OpError {
    fn from(e: recflow_mem::error::Error) -> Self {
        OpError::Config(e.to_string())
    }
}

/// How many input streams an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Nary { min: usize, max: usize },
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Unary => n == 1,
            Arity::Nary { min, max } => (min..=max).contains(&n),
        }
    }
}

/// Trait that all operators implement.
///
/// Invariants:
/// - `eval` is deterministic given the same inputs and configuration.
/// - Output records never share payload storage with inputs.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Transform the input streams into one output stream.
    fn eval(&self, inputs: &[Stream]) -> Result<Stream, OpError>;
}

/// Output of one operator call through the degrade boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub records: Stream,
    /// True when `records` is the single error record.
    pub degraded: bool,
}

/// Run `op` and never fail: errors become one error-shaped record.
pub fn invoke(op: &dyn Operator, inputs: &[Stream]) -> Invocation {
    match op.eval(inputs) {
        Ok(records) => Invocation {
            records,
            degraded: false,
        },
        Err(e) => {
            tracing::warn!(operator = op.name(), kind = e.kind(), error = %e, "operator degraded to error record");
            Invocation {
                records: vec![error_record(op.name(), &e)],
                degraded: true,
            }
        }
    }
}

/// `{ "error": ..., "errorKind": ..., "operator": ... }`
pub fn error_record(operator: &str, err: &OpError) -> Record {
    let mut json = Map::new();
    json.insert("error".into(), Value::String(err.to_string()));
    json.insert("errorKind".into(), Value::String(err.kind().into()));
    json.insert("operator".into(), Value::String(operator.into()));
    Record::new(json, 0)
}
