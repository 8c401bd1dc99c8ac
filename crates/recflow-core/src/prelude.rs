//! Convenient re-exports for downstream crates.

pub use crate::budget::{Admission, MemoryBudget};
pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::id::OpId;
pub use crate::manifest::{ManifestId, RunManifest, StepReport};
pub use crate::options::{
    BatchMode, BatchProcessing, CombineBy, IterationConfig, IterationMode, JoinMode, MergeConfig,
    MergeMode,
};
pub use crate::path::FieldPath;
pub use crate::record::{Attachment, Record, Stream};
