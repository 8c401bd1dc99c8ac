#![forbid(unsafe_code)]
//! recflow-mem: approximate, invocation-scoped memory governor.
//!
//! This crate provides the concrete implementation of the `MemoryBudget`
//! interface defined in `recflow-core::budget`. Accounting is deliberately
//! cheap: sizes are estimated from the JSON shape, and the ceiling is only
//! checked every `check_interval` items.
//!
//! A governor is created at the start of one operator invocation and dropped
//! at the end. It is never shared across threads.

pub mod error;
pub mod estimate;
pub mod governor;
pub mod tracking;

pub use estimate::{estimate_record, estimate_value};
pub use governor::{GovernorSettings, MemoryGovernor};
pub use tracking::PeakTracker;
