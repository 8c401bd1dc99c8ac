#![forbid(unsafe_code)]
//! recflow-exec: sequential runtime, deterministic replay hashes and metrics.
//!
//! The runtime walks a `PhysicalProgram` step by step on the calling thread.
//! Every operator call goes through the degrade boundary, so a failing step
//! produces an error record instead of aborting the run.

pub mod metrics;
pub mod replay;
pub mod runtime;

pub use runtime::{Engine, ExecError, RunOutput};
