#![forbid(unsafe_code)]
//! recflow-planner: YAML pipelines → validated step graph → physical program
//! with operator bindings.
//!
//! Design:
//! - The DSL names streams: pipeline inputs plus one stream per step id.
//! - Validation happens once, before anything runs: ids, references,
//!   arity and config shape.
//! - Lowering assigns `OpId`s in step order and operator *keys* (strings;
//!   exec instantiates via `recflow-operators::registry`).

pub mod dsl;
pub mod error;
pub mod logical;
pub mod lower;
pub mod physical;
pub mod validate;

pub use dsl::yaml::{parse_yaml_pipeline, Pipeline, StepDef};
pub use error::PlanError;
pub use logical::{LogicalPipeline, LogicalStep, StreamRef};
pub use lower::lower_to_physical;
pub use physical::{OperatorBinding, PhysicalProgram, PhysicalStep};
pub use validate::validate;

/// Parse, validate and lower in one go.
pub fn plan_yaml(src: &str) -> Result<PhysicalProgram, PlanError> {
    let pipeline = parse_yaml_pipeline(src)?;
    let logical = validate(&pipeline)?;
    Ok(lower_to_physical(&logical))
}
