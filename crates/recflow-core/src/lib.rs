#![forbid(unsafe_code)]
//! recflow-core: record model, field paths, operator configuration and
//! provenance types shared by every recflow crate.
//!
//! Pure data plus small helpers. No operator logic and no I/O live here.

pub mod budget;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod keywords;
pub mod manifest;
pub mod options;
pub mod path;
pub mod prelude;
pub mod record;

/// Engine version stamped into run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
