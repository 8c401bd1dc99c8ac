#![forbid(unsafe_code)]
//! recflow: in-memory record stream transformations.
//!
//! Facade over the workspace crates. Most users want [`plan_yaml`] plus
//! [`Engine`], or the operators directly through [`Registry`].

pub use recflow_core::prelude;
pub use recflow_exec::{Engine, ExecError, RunOutput};
pub use recflow_mem::{GovernorSettings, MemoryGovernor};
pub use recflow_operators::{
    invoke, BatchOp, IterateOp, IterationStats, MergeOp, OpError, Operator, Registry, Truncation,
};
pub use recflow_planner::{plan_yaml, PhysicalProgram, PlanError};
