//! Iteration operator: expands one stream into a derived stream.
//!
//! Modes: each-item, array-field, object-properties, range. All modes share
//! one `Emitter`, which owns the invocation's memory governor and enforces
//! `maxIterations`, `maxArraySize` and the large-item policy. Soft limits
//! truncate the output; they never fail the invocation.

pub mod flatten;
pub mod source;

use serde_json::{json, Map, Value};

use recflow_core::budget::{Admission, MemoryBudget};
use recflow_core::config::EngineConfig;
use recflow_core::keywords::KeywordTable;
use recflow_core::options::{from_json, IterationConfig, IterationMode};
use recflow_core::path::FieldPath;
use recflow_core::record::{is_empty_value, Record, Stream};
use recflow_mem::{estimate_record, GovernorSettings, MemoryGovernor};

use crate::batch::BatchOp;
use crate::traits::{Arity, OpError, Operator};

use self::flatten::flatten_object;
use self::source::{locate_array, locate_object};

pub const ITERATION_META_FIELD: &str = "_iteration";

/// Why an invocation stopped before consuming all of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    MaxIterations,
    MaxArraySize,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationStats {
    pub emitted: usize,
    pub skipped_empty: usize,
    pub skipped_large: usize,
    /// Input records with no usable array/mapping.
    pub without_source: usize,
    pub peak_bytes: usize,
    pub truncated_by: Option<Truncation>,
}

#[derive(Debug, Clone, Copy)]
struct RangeSpec {
    start: f64,
    end: f64,
    step: f64,
    integral: bool,
}

impl RangeSpec {
    fn count(&self) -> usize {
        let span = if self.step > 0.0 {
            self.end - self.start
        } else {
            self.start - self.end
        };
        if span <= 0.0 {
            return 0;
        }
        // Saturating float-to-int cast. The quotient may round either way,
        // so settle the count on the values actually emitted.
        let mut n = (span / self.step.abs()).ceil() as usize;
        while n > 0 && !self.before_end(self.raw_at(n - 1)) {
            n -= 1;
        }
        while n < usize::MAX && self.before_end(self.raw_at(n)) {
            n += 1;
        }
        n
    }

    /// `end` is exclusive in the direction of `step`.
    fn before_end(&self, v: f64) -> bool {
        if self.step > 0.0 {
            v < self.end
        } else {
            v > self.end
        }
    }

    fn raw_at(&self, j: usize) -> f64 {
        self.start + (j as f64) * self.step
    }

    fn value_at(&self, j: usize) -> Value {
        let v = self.raw_at(j);
        if self.integral {
            json!(v as i64)
        } else {
            json!(v)
        }
    }
}

/// Largest magnitude that round-trips exactly through f64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub struct IterateOp {
    cfg: IterationConfig,
    governor: GovernorSettings,
    max_emit: Option<usize>,
    array_path: Option<FieldPath>,
    object_path: Option<FieldPath>,
    range: Option<RangeSpec>,
    keywords: KeywordTable,
    batch: Option<BatchOp>,
}

impl IterateOp {
    /// Validate `cfg` and resolve limits against `engine` defaults.
    pub fn new(cfg: IterationConfig, engine: &EngineConfig) -> Result<Self, OpError> {
        let governor = GovernorSettings::resolve(&cfg.options, engine)?;

        let max_emit = match (cfg.options.max_iterations, engine.max_iterations_cap) {
            (0, cap) => cap,
            (n, Some(cap)) => Some(n.min(cap)),
            (n, None) => Some(n),
        };

        let array_path = match (cfg.iteration_mode, cfg.array_field.as_deref()) {
            (IterationMode::ArrayField, Some(f)) if !f.trim().is_empty() => {
                Some(FieldPath::parse(f)?)
            }
            _ => None,
        };

        let object_path = match (
            cfg.iteration_mode,
            cfg.object_options.object_field.as_deref(),
        ) {
            (IterationMode::ObjectProperties, Some(f)) if !f.trim().is_empty() => {
                Some(FieldPath::parse(f)?)
            }
            _ => None,
        };

        let range = if cfg.iteration_mode == IterationMode::Range {
            let r = &cfg.range_options;
            if !(r.range_start.is_finite() && r.range_end.is_finite() && r.range_step.is_finite())
            {
                return Err(OpError::Config(
                    "rangeStart, rangeEnd and rangeStep must be finite numbers".into(),
                ));
            }
            if r.range_step == 0.0 {
                return Err(OpError::Config("rangeStep must not be zero".into()));
            }
            let integral = r.range_start.fract() == 0.0
                && r.range_step.fract() == 0.0
                && r.range_start.abs() < MAX_EXACT_INT
                && r.range_end.abs() < MAX_EXACT_INT;
            Some(RangeSpec {
                start: r.range_start,
                end: r.range_end,
                step: r.range_step,
                integral,
            })
        } else {
            None
        };

        let batch = if cfg.batch_processing.enable_batching {
            Some(BatchOp::new(&cfg.batch_processing)?)
        } else {
            None
        };

        let keywords = KeywordTable::for_target(cfg.options.keyword_target);

        Ok(Self {
            cfg,
            governor,
            max_emit,
            array_path,
            object_path,
            range,
            keywords,
            batch,
        })
    }

    pub fn from_json(raw: &Value, engine: &EngineConfig) -> Result<Self, OpError> {
        let cfg: IterationConfig = from_json(raw)?;
        Self::new(cfg, engine)
    }

    pub fn config(&self) -> &IterationConfig {
        &self.cfg
    }

    /// Expand `input` and report what happened along the way.
    pub fn run(&self, input: &[Record]) -> (Stream, IterationStats) {
        let mut em = Emitter::new(MemoryGovernor::new(self.governor), self.max_emit);

        match self.cfg.iteration_mode {
            IterationMode::EachItem => self.each_item(input, &mut em),
            IterationMode::ArrayField => self.array_field(input, &mut em),
            IterationMode::ObjectProperties => self.object_properties(input, &mut em),
            IterationMode::Range => self.range(input, &mut em),
        }

        let (mut out, stats) = em.finish();
        if let Some(truncation) = stats.truncated_by {
            tracing::warn!(
                mode = self.cfg.iteration_mode.as_str(),
                ?truncation,
                emitted = stats.emitted,
                "iteration stopped early"
            );
        }
        tracing::debug!(
            mode = self.cfg.iteration_mode.as_str(),
            emitted = stats.emitted,
            skipped_empty = stats.skipped_empty,
            skipped_large = stats.skipped_large,
            without_source = stats.without_source,
            peak_bytes = stats.peak_bytes,
            "iteration finished"
        );

        if let Some(batch) = &self.batch {
            out = batch.apply(out);
        }
        (out, stats)
    }

    fn each_item(&self, input: &[Record], em: &mut Emitter) {
        let total = input.len();
        for (i, rec) in input.iter().enumerate() {
            if em.full() {
                return;
            }
            let mut json = Map::new();
            json.insert(self.cfg.output_field_name.clone(), rec.to_value());
            json.insert(self.cfg.index_field_name.clone(), json!(i));
            self.attach_meta(&mut json, i, total, None);
            if em.push(rec.derive(json)).is_stop() {
                return;
            }
        }
    }

    fn array_field(&self, input: &[Record], em: &mut Emitter) {
        let opts = &self.cfg.options;
        let field = self.array_path.as_ref().map(|p| Value::String(p.to_string()));
        let reserved = self.reserved_fields();

        for rec in input {
            let Some((items, found_in)) = locate_array(&rec.json, self.array_path.as_ref())
            else {
                tracing::debug!(index = rec.index, "no array found in record, skipping");
                em.stats.without_source += 1;
                continue;
            };
            tracing::trace!(index = rec.index, ?found_in, len = items.len(), "iterating array");

            let allowed = em.examine(items.len(), opts.max_array_size);
            let mut kept: Vec<&Value> = Vec::with_capacity(allowed);
            for el in &items[..allowed] {
                if opts.skip_empty_values && is_empty_value(el) {
                    em.stats.skipped_empty += 1;
                } else {
                    kept.push(el);
                }
            }

            let total = kept.len();
            for (j, el) in kept.into_iter().enumerate() {
                if em.full() {
                    return;
                }
                let mut json = match (opts.flatten, el) {
                    (true, Value::Object(obj)) => {
                        flatten_object(obj, opts.flatten_depth, &self.keywords, &reserved)
                    }
                    _ => {
                        let mut m = Map::new();
                        m.insert(self.cfg.output_field_name.clone(), el.clone());
                        m
                    }
                };
                json.insert(self.cfg.index_field_name.clone(), json!(j));
                self.attach_original(&mut json, rec);
                self.attach_meta(&mut json, j, total, field.clone());
                if em.push(self.shape(rec, json)).is_stop() {
                    return;
                }
            }

            if allowed < items.len() {
                em.stop(Truncation::MaxArraySize);
                return;
            }
        }
    }

    fn object_properties(&self, input: &[Record], em: &mut Emitter) {
        let oo = &self.cfg.object_options;
        let field = self.object_path.as_ref().map(|p| Value::String(p.to_string()));

        for rec in input {
            let Some(mapping) = locate_object(&rec.json, self.object_path.as_ref()) else {
                tracing::debug!(index = rec.index, "object field missing or not a mapping, skipping");
                em.stats.without_source += 1;
                continue;
            };

            let mut pairs: Vec<(&String, &Value)> = Vec::with_capacity(mapping.len());
            for (k, v) in mapping {
                if self.cfg.options.skip_empty_values && is_empty_value(v) {
                    em.stats.skipped_empty += 1;
                } else {
                    pairs.push((k, v));
                }
            }

            let total = pairs.len();
            for (j, (k, v)) in pairs.into_iter().enumerate() {
                if em.full() {
                    return;
                }
                let mut json = Map::new();
                json.insert(oo.key_field_name.clone(), Value::String(k.clone()));
                json.insert(oo.value_field_name.clone(), v.clone());
                json.insert(self.cfg.index_field_name.clone(), json!(j));
                self.attach_original(&mut json, rec);
                self.attach_meta(&mut json, j, total, field.clone());
                if em.push(self.shape(rec, json)).is_stop() {
                    return;
                }
            }
        }
    }

    fn range(&self, input: &[Record], em: &mut Emitter) {
        let Some(spec) = self.range else {
            return;
        };
        let total = spec.count();
        let value_field = &self.cfg.range_options.value_field_name;

        for rec in input {
            for j in 0..total {
                if em.full() {
                    return;
                }
                let mut json = Map::new();
                json.insert(value_field.clone(), spec.value_at(j));
                json.insert(self.cfg.index_field_name.clone(), json!(j));
                self.attach_original(&mut json, rec);
                if self.cfg.options.include_metadata {
                    json.insert(
                        ITERATION_META_FIELD.into(),
                        json!({
                            "mode": IterationMode::Range.as_str(),
                            "range": { "start": spec.start, "end": spec.end, "step": spec.step },
                            "index": j,
                            "total": total,
                        }),
                    );
                }
                if em.push(self.shape(rec, json)).is_stop() {
                    return;
                }
            }
        }
    }

    /// Derived records keep provenance; attachments travel only with the
    /// original data.
    fn shape(&self, rec: &Record, json: Map<String, Value>) -> Record {
        if self.cfg.include_original_data {
            rec.derive(json)
        } else {
            Record::new(json, rec.index)
        }
    }

    /// Output fields written after a flattened element.
    fn reserved_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.cfg.index_field_name.as_str()];
        if self.cfg.include_original_data {
            fields.push(self.cfg.original_field_name.as_str());
        }
        if self.cfg.options.include_metadata {
            fields.push(ITERATION_META_FIELD);
        }
        fields
    }

    fn attach_original(&self, json: &mut Map<String, Value>, rec: &Record) {
        if self.cfg.include_original_data {
            json.insert(self.cfg.original_field_name.clone(), rec.to_value());
        }
    }

    fn attach_meta(&self, json: &mut Map<String, Value>, index: usize, total: usize, field: Option<Value>) {
        if !self.cfg.options.include_metadata {
            return;
        }
        let mut meta = Map::new();
        meta.insert("mode".into(), json!(self.cfg.iteration_mode.as_str()));
        if let Some(field) = field {
            meta.insert("field".into(), field);
        }
        meta.insert("index".into(), json!(index));
        meta.insert("total".into(), json!(total));
        json.insert(ITERATION_META_FIELD.into(), Value::Object(meta));
    }
}

impl Operator for IterateOp {
    fn name(&self) -> &'static str {
        "iterate"
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn eval(&self, inputs: &[Stream]) -> Result<Stream, OpError> {
        let input = inputs
            .first()
            .ok_or_else(|| OpError::Config("iterate expects one input stream".into()))?;
        Ok(self.run(input).0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl Flow {
    fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

/// Collects output and applies every soft limit in one place.
struct Emitter {
    out: Stream,
    governor: MemoryGovernor,
    max_emit: Option<usize>,
    examined: usize,
    stats: IterationStats,
}

impl Emitter {
    fn new(governor: MemoryGovernor, max_emit: Option<usize>) -> Self {
        Self {
            out: Vec::new(),
            governor,
            max_emit,
            examined: 0,
            stats: IterationStats::default(),
        }
    }

    /// True once `maxIterations` records were emitted or a limit tripped.
    /// Marks the truncation the first time it is hit.
    fn full(&mut self) -> bool {
        if self.stats.truncated_by.is_some() {
            return true;
        }
        match self.max_emit {
            Some(max) if self.out.len() >= max => {
                self.stats.truncated_by = Some(Truncation::MaxIterations);
                true
            }
            _ => false,
        }
    }

    /// Reserve up to `len` array elements against `cap` (0 = unlimited) and
    /// return how many may be examined.
    fn examine(&mut self, len: usize, cap: usize) -> usize {
        let allowed = if cap == 0 {
            len
        } else {
            len.min(cap.saturating_sub(self.examined))
        };
        self.examined += allowed;
        allowed
    }

    fn stop(&mut self, why: Truncation) {
        if self.stats.truncated_by.is_none() {
            self.stats.truncated_by = Some(why);
        }
    }

    fn push(&mut self, rec: Record) -> Flow {
        let bytes = estimate_record(&rec);
        if self.governor.is_large(bytes) {
            tracing::debug!(index = rec.index, bytes, "dropping item above large-item threshold");
            self.stats.skipped_large += 1;
            return Flow::Continue;
        }
        match self.governor.admit(bytes) {
            Admission::Accepted => {
                self.out.push(rec);
                Flow::Continue
            }
            Admission::Breached => {
                tracing::warn!(
                    used_bytes = self.governor.used_bytes(),
                    limit_bytes = self.governor.limit_bytes(),
                    "memory limit reached, keeping records produced so far"
                );
                self.stop(Truncation::Memory);
                Flow::Stop
            }
        }
    }

    fn finish(mut self) -> (Stream, IterationStats) {
        self.stats.emitted = self.out.len();
        self.stats.peak_bytes = self.governor.peak_bytes();
        (self.out, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recflow_core::record::payloads_to_stream;

    fn op(raw: Value) -> IterateOp {
        IterateOp::from_json(&raw, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn each_item_nests_payload_and_index() {
        let input = payloads_to_stream(vec![json!({"a": 1}), json!({"a": 2})]);
        let (out, stats) = op(json!({})).run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].json["item"], json!({"a": 2}));
        assert_eq!(out[1].json["index"], 1);
        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.truncated_by, None);
    }

    #[test]
    fn array_field_skips_empty_before_indexing() {
        let input = payloads_to_stream(vec![json!({"xs": [1, null, "", 2, [], {}]})]);
        let it = op(json!({
            "iterationMode": "arrayField",
            "arrayField": "xs",
            "options": { "skipEmptyValues": true, "includeMetadata": true }
        }));
        let (out, stats) = it.run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].json["item"], 2);
        assert_eq!(out[1].json["index"], 1);
        assert_eq!(out[1].json["_iteration"]["total"], 2);
        assert_eq!(out[1].json["_iteration"]["field"], "xs");
        assert_eq!(stats.skipped_empty, 4);
    }

    #[test]
    fn max_array_size_caps_examined_elements() {
        let input = payloads_to_stream(vec![json!({"xs": [1, 2, 3]}), json!({"xs": [4, 5]})]);
        let it = op(json!({
            "iterationMode": "arrayField",
            "arrayField": "xs",
            "options": { "maxArraySize": 4 }
        }));
        let (out, stats) = it.run(&input);
        let items: Vec<_> = out.iter().map(|r| r.json["item"].clone()).collect();
        assert_eq!(items, vec![json!(1), json!(2), json!(3), json!(4)]);
        assert_eq!(stats.truncated_by, Some(Truncation::MaxArraySize));
    }

    #[test]
    fn engine_cap_lowers_max_iterations() {
        let engine = EngineConfig {
            max_iterations_cap: Some(2),
            ..EngineConfig::default()
        };
        let it = IterateOp::from_json(
            &json!({"iterationMode": "range", "options": {"maxIterations": 5}}),
            &engine,
        )
        .unwrap();
        let (out, stats) = it.run(&payloads_to_stream(vec![json!({})]));
        assert_eq!(out.len(), 2);
        assert_eq!(stats.truncated_by, Some(Truncation::MaxIterations));
    }

    #[test]
    fn range_values_and_direction() {
        let input = payloads_to_stream(vec![json!({})]);
        let up = op(json!({"iterationMode": "range", "rangeOptions": {"rangeStart": 0, "rangeEnd": 5, "rangeStep": 2}}));
        let vals: Vec<_> = up.run(&input).0.iter().map(|r| r.json["value"].clone()).collect();
        assert_eq!(vals, vec![json!(0), json!(2), json!(4)]);

        let down = op(json!({"iterationMode": "range", "rangeOptions": {"rangeStart": 1, "rangeEnd": 0, "rangeStep": -0.25}}));
        let vals: Vec<_> = down.run(&input).0.iter().map(|r| r.json["value"].clone()).collect();
        assert_eq!(vals, vec![json!(1.0), json!(0.75), json!(0.5), json!(0.25)]);

        let empty = op(json!({"iterationMode": "range", "rangeOptions": {"rangeStart": 3, "rangeEnd": 3}}));
        assert!(empty.run(&input).0.is_empty());
    }

    #[test]
    fn range_end_is_exclusive_for_fractional_steps() {
        let input = payloads_to_stream(vec![json!({})]);
        let up = op(json!({"iterationMode": "range", "rangeOptions": {"rangeStart": 0, "rangeEnd": 2.1, "rangeStep": 0.3}}));
        let vals: Vec<f64> = up.run(&input).0.iter().map(|r| r.json["value"].as_f64().unwrap()).collect();
        assert_eq!(vals.len(), 7);
        assert!(vals.iter().all(|v| *v < 2.1));

        let down = op(json!({"iterationMode": "range", "rangeOptions": {"rangeStart": 2.1, "rangeEnd": 0, "rangeStep": -0.3}}));
        let vals: Vec<f64> = down.run(&input).0.iter().map(|r| r.json["value"].as_f64().unwrap()).collect();
        assert_eq!(vals.len(), 7);
        assert!(vals.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn range_rejects_zero_step() {
        let err = IterateOp::from_json(
            &json!({"iterationMode": "range", "rangeOptions": {"rangeStep": 0}}),
            &EngineConfig::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn object_properties_whole_payload_by_default() {
        let input = payloads_to_stream(vec![json!({"x": 1, "y": 2})]);
        let (out, _) = op(json!({"iterationMode": "objectProperties"})).run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].json["key"], "x");
        assert_eq!(out[1].json["value"], 2);
    }

    #[test]
    fn large_items_are_dropped_not_counted() {
        let big = "x".repeat(4096);
        let input = payloads_to_stream(vec![json!({"xs": ["a", big, "b"]})]);
        let it = op(json!({
            "iterationMode": "arrayField",
            "arrayField": "xs",
            "options": { "skipLargeItems": true, "largeItemThresholdKB": 1 }
        }));
        let (out, stats) = it.run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(stats.skipped_large, 1);
    }

    #[test]
    fn memory_breach_keeps_records_so_far() {
        let xs: Vec<Value> = (0..50).map(|i| json!("y".repeat(100 + i))).collect();
        let input = payloads_to_stream(vec![json!({ "xs": xs })]);
        let it = op(json!({
            "iterationMode": "arrayField",
            "arrayField": "xs",
            "options": { "enableMemoryManagement": true, "memoryLimitMB": 0.001, "checkInterval": 1 }
        }));
        let (out, stats) = it.run(&input);
        assert!(!out.is_empty() && out.len() < 50);
        assert_eq!(stats.truncated_by, Some(Truncation::Memory));
        assert_eq!(out[0].json["item"], xs[0]);
    }

    #[test]
    fn batching_wraps_output() {
        let input = payloads_to_stream(vec![json!({"xs": [1, 2, 3]})]);
        let it = op(json!({
            "iterationMode": "arrayField",
            "arrayField": "xs",
            "batchProcessing": { "enableBatching": true, "batchSize": 2 }
        }));
        let (out, _) = it.run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].json["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(out[1].json["_batch"]["totalBatches"], 2);
    }
}
