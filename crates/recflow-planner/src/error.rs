use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("pipeline has no steps")]
    Empty,

    #[error("duplicate stream name '{0}'")]
    Duplicate(String),

    #[error("step '{step}' reads '{name}', which is not an input or an earlier step")]
    UnknownStream { step: String, name: String },

    #[error("step '{step}' ({op}) takes {expected} input streams, got {got}")]
    Arity {
        step: String,
        op: String,
        expected: String,
        got: usize,
    },

    #[error("step '{step}' must use either `input` or `inputs`, not both")]
    AmbiguousInputs { step: String },

    #[error("step '{step}' config: {reason}")]
    Config { step: String, reason: String },

    #[error("output '{0}' does not name a step")]
    UnknownOutput(String),
}
