//! Caller-supplied operator configuration, deserialized from the camelCase
//! JSON objects the surrounding engine hands to each step.
//!
//! These are immutable for the duration of one invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::keywords::KeywordTarget;

fn default_item_field() -> String {
    "item".to_string()
}
fn default_index_field() -> String {
    "index".to_string()
}
fn default_original_field() -> String {
    "originalData".to_string()
}
fn default_key_field() -> String {
    "key".to_string()
}
fn default_value_field() -> String {
    "value".to_string()
}
fn default_batch_field() -> String {
    "items".to_string()
}
fn default_batch_size() -> i64 {
    10
}
fn default_flatten_depth() -> usize {
    3
}
fn default_max_array_size() -> usize {
    10_000
}
fn default_range_end() -> f64 {
    10.0
}
fn default_range_step() -> f64 {
    1.0
}
fn default_number_inputs() -> usize {
    2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IterationMode {
    #[default]
    EachItem,
    ArrayField,
    ObjectProperties,
    Range,
}

impl IterationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            IterationMode::EachItem => "eachItem",
            IterationMode::ArrayField => "arrayField",
            IterationMode::ObjectProperties => "objectProperties",
            IterationMode::Range => "range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationOptions {
    #[serde(default)]
    pub skip_empty_values: bool,
    /// Total records emitted by one invocation; 0 means unlimited.
    #[serde(default)]
    pub max_iterations: usize,
    /// Total array elements examined by one invocation; 0 means unlimited.
    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,
    #[serde(default)]
    pub enable_memory_management: bool,
    #[serde(default, rename = "memoryLimitMB")]
    pub memory_limit_mb: Option<f64>,
    #[serde(default)]
    pub check_interval: Option<usize>,
    #[serde(default)]
    pub skip_large_items: bool,
    #[serde(default, rename = "largeItemThresholdKB")]
    pub large_item_threshold_kb: Option<f64>,
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default)]
    pub flatten: bool,
    #[serde(default = "default_flatten_depth")]
    pub flatten_depth: usize,
    #[serde(default)]
    pub keyword_target: KeywordTarget,
}

impl Default for IterationOptions {
    fn default() -> Self {
        Self {
            skip_empty_values: false,
            max_iterations: 0,
            max_array_size: default_max_array_size(),
            enable_memory_management: false,
            memory_limit_mb: None,
            check_interval: None,
            skip_large_items: false,
            large_item_threshold_kb: None,
            include_metadata: false,
            flatten: false,
            flatten_depth: default_flatten_depth(),
            keyword_target: KeywordTarget::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeOptions {
    #[serde(default)]
    pub range_start: f64,
    #[serde(default = "default_range_end")]
    pub range_end: f64,
    #[serde(default = "default_range_step")]
    pub range_step: f64,
    #[serde(default = "default_value_field")]
    pub value_field_name: String,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            range_start: 0.0,
            range_end: default_range_end(),
            range_step: default_range_step(),
            value_field_name: default_value_field(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectOptions {
    #[serde(default)]
    pub object_field: Option<String>,
    #[serde(default = "default_key_field")]
    pub key_field_name: String,
    #[serde(default = "default_value_field")]
    pub value_field_name: String,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            object_field: None,
            key_field_name: default_key_field(),
            value_field_name: default_value_field(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchMode {
    #[default]
    ArrayField,
    SeparateItems,
    MergeObjects,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessing {
    #[serde(default)]
    pub enable_batching: bool,
    /// Signed so a non-positive size reaches validation instead of failing
    /// deserialization.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default)]
    pub batch_mode: BatchMode,
    #[serde(default = "default_batch_field")]
    pub batch_field_name: String,
}

impl Default for BatchProcessing {
    fn default() -> Self {
        Self {
            enable_batching: false,
            batch_size: default_batch_size(),
            batch_mode: BatchMode::default(),
            batch_field_name: default_batch_field(),
        }
    }
}

impl BatchProcessing {
    /// Validated chunk size.
    pub fn size(&self) -> Result<usize> {
        if self.batch_size <= 0 {
            return Err(Error::Config(format!(
                "batchSize must be positive, got {}",
                self.batch_size
            )));
        }
        Ok(self.batch_size as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationConfig {
    #[serde(default)]
    pub iteration_mode: IterationMode,
    #[serde(default)]
    pub array_field: Option<String>,
    #[serde(default)]
    pub include_original_data: bool,
    #[serde(default = "default_item_field")]
    pub output_field_name: String,
    #[serde(default = "default_index_field")]
    pub index_field_name: String,
    #[serde(default = "default_original_field")]
    pub original_field_name: String,
    #[serde(default)]
    pub options: IterationOptions,
    #[serde(default)]
    pub range_options: RangeOptions,
    #[serde(default)]
    pub object_options: ObjectOptions,
    #[serde(default)]
    pub batch_processing: BatchProcessing,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            iteration_mode: IterationMode::default(),
            array_field: None,
            include_original_data: false,
            output_field_name: default_item_field(),
            index_field_name: default_index_field(),
            original_field_name: default_original_field(),
            options: IterationOptions::default(),
            range_options: RangeOptions::default(),
            object_options: ObjectOptions::default(),
            batch_processing: BatchProcessing::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMode {
    #[default]
    Append,
    Combine,
    MergeByKey,
    Multiplex,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMode::Append => "append",
            MergeMode::Combine => "combine",
            MergeMode::MergeByKey => "mergeByKey",
            MergeMode::Multiplex => "multiplex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CombineBy {
    #[default]
    Position,
    Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinMode {
    #[default]
    Inner,
    Left,
    Outer,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeFields {
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeByKeyOptions {
    #[serde(default)]
    pub match_key: Option<String>,
    #[serde(default)]
    pub join_mode: JoinMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplexOptions {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfig {
    #[serde(default)]
    pub mode: MergeMode,
    #[serde(default)]
    pub combine_by: CombineBy,
    #[serde(default = "default_number_inputs")]
    pub number_inputs: usize,
    #[serde(default)]
    pub merge_fields: MergeFields,
    #[serde(default)]
    pub merge_by_key: MergeByKeyOptions,
    #[serde(default)]
    pub multiplex_options: MultiplexOptions,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mode: MergeMode::default(),
            combine_by: CombineBy::default(),
            number_inputs: default_number_inputs(),
            merge_fields: MergeFields::default(),
            merge_by_key: MergeByKeyOptions::default(),
            multiplex_options: MultiplexOptions::default(),
        }
    }
}

pub const MIN_MERGE_INPUTS: usize = 2;
pub const MAX_MERGE_INPUTS: usize = 10;

/// Deserialize an operator config from the raw JSON object. A `null` config
/// means "all defaults".
pub fn from_json<T: serde::de::DeserializeOwned + Default>(raw: &Value) -> Result<T> {
    if raw.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(raw.clone()).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iteration_config_reads_camel_case_keys() {
        let cfg: IterationConfig = from_json(&json!({
            "iterationMode": "arrayField",
            "arrayField": "orders.lines",
            "includeOriginalData": true,
            "options": { "skipEmptyValues": true, "maxIterations": 5, "memoryLimitMB": 2 },
            "rangeOptions": { "rangeStart": 1, "rangeEnd": 4 },
            "batchProcessing": { "enableBatching": true, "batchSize": 3, "batchMode": "mergeObjects" }
        }))
        .unwrap();
        assert_eq!(cfg.iteration_mode, IterationMode::ArrayField);
        assert_eq!(cfg.array_field.as_deref(), Some("orders.lines"));
        assert!(cfg.include_original_data);
        assert!(cfg.options.skip_empty_values);
        assert_eq!(cfg.options.max_iterations, 5);
        assert_eq!(cfg.options.memory_limit_mb, Some(2.0));
        assert_eq!(cfg.options.flatten_depth, 3);
        assert_eq!(cfg.range_options.range_step, 1.0);
        assert_eq!(cfg.batch_processing.batch_mode, BatchMode::MergeObjects);
        assert_eq!(cfg.output_field_name, "item");
    }

    #[test]
    fn null_config_is_default() {
        let cfg: MergeConfig = from_json(&Value::Null).unwrap();
        assert_eq!(cfg, MergeConfig::default());
        assert_eq!(cfg.number_inputs, 2);
    }

    #[test]
    fn unknown_mode_is_config_error() {
        let err = from_json::<MergeConfig>(&json!({"mode": "zip"})).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn non_positive_batch_size_rejected() {
        let b = BatchProcessing {
            batch_size: 0,
            ..Default::default()
        };
        assert!(b.size().is_err());
        let b = BatchProcessing {
            batch_size: -2,
            ..Default::default()
        };
        assert!(b.size().is_err());
    }
}
