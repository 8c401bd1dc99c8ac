#![forbid(unsafe_code)]
//! recflow-operators: iteration, batch and merge operators over materialized
//! record streams.
//!
//! Design intent:
//! - Pure and synchronous. One call consumes fully materialized inputs and
//!   returns a fully materialized output; no threads, no I/O.
//! - Every emitted record owns its payload (deep copies, no aliasing).
//! - Callers go through [`invoke`], which turns any `OpError` into a single
//!   error record so a pipeline never aborts on a bad step.

pub mod batch;
pub mod iterate;
pub mod merge;
pub mod registry;
pub mod traits;

pub use batch::BatchOp;
pub use iterate::{IterateOp, IterationStats, Truncation};
pub use merge::MergeOp;
pub use registry::Registry;
pub use traits::{invoke, Arity, Invocation, OpError, Operator};
