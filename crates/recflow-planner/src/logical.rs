//! Validated pipeline: every reference resolved, every config checked.

use serde::{Deserialize, Serialize};

/// Where a step reads a stream from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum StreamRef {
    Input(String),
    Step(String),
}

impl StreamRef {
    pub fn name(&self) -> &str {
        match self {
            StreamRef::Input(n) | StreamRef::Step(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalStep {
    pub id: String,
    pub key: String,
    pub inputs: Vec<StreamRef>,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalPipeline {
    pub inputs: Vec<String>,
    pub steps: Vec<LogicalStep>,
    /// Index into `steps`.
    pub output: usize,
}
