//! Operator registry: binding key + JSON config → operator instance.

use serde_json::Value;

use recflow_core::config::EngineConfig;
use recflow_core::options::{MAX_MERGE_INPUTS, MIN_MERGE_INPUTS};

use crate::batch::BatchOp;
use crate::iterate::IterateOp;
use crate::merge::MergeOp;
use crate::traits::{Arity, OpError, Operator};

pub const KEYS: [&str; 3] = ["iterate", "batch", "merge"];

/// Builds operators for the exec runtime. Holds the engine defaults that
/// iteration limits are resolved against.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    engine: EngineConfig,
}

impl Registry {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn contains(&self, key: &str) -> bool {
        KEYS.contains(&key)
    }

    /// Input arity for `key`, known before any config is parsed.
    pub fn arity(&self, key: &str) -> Option<Arity> {
        match key {
            "iterate" | "batch" => Some(Arity::Unary),
            "merge" => Some(Arity::Nary {
                min: MIN_MERGE_INPUTS,
                max: MAX_MERGE_INPUTS,
            }),
            _ => None,
        }
    }

    pub fn make(&self, key: &str, config: &Value) -> Result<Box<dyn Operator>, OpError> {
        let op: Box<dyn Operator> = match key {
            "iterate" => Box::new(IterateOp::from_json(config, &self.engine)?),
            "batch" => Box::new(BatchOp::from_json(config)?),
            "merge" => Box::new(MergeOp::from_json(config)?),
            other => return Err(OpError::Config(format!("unknown operator key: {other}"))),
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_known_keys() {
        let reg = Registry::default();
        for key in KEYS {
            let op = reg.make(key, &Value::Null).unwrap();
            assert_eq!(op.name(), key);
            assert_eq!(Some(op.arity()), reg.arity(key));
        }
    }

    #[test]
    fn unknown_key_and_bad_config_fail() {
        let reg = Registry::default();
        assert!(reg.make("sort", &json!({})).is_err());
        assert!(reg.make("batch", &json!({"batchSize": 0})).is_err());
        assert!(reg.arity("sort").is_none());
    }
}
