//! Process-level engine defaults that operator configs fall back to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memory ceiling used when an iteration enables memory management
    /// without naming its own limit.
    pub memory_limit_bytes: usize,

    /// How many processed items pass between memory checks.
    pub check_interval_items: usize,

    /// Items estimated above this size count as "large".
    pub large_item_threshold_bytes: usize,

    /// Optional global ceiling on records emitted by one iteration.
    pub max_iterations_cap: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 512 * 1024 * 1024, // 512 MiB default
            check_interval_items: 100,
            large_item_threshold_bytes: 1024 * 1024,
            max_iterations_cap: None,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RECFLOW_MEMORY_LIMIT_BYTES`: default memory ceiling in bytes
    /// - `RECFLOW_CHECK_INTERVAL`: items between memory checks
    /// - `RECFLOW_LARGE_ITEM_BYTES`: large-item threshold in bytes
    /// - `RECFLOW_MAX_ITERATIONS`: global cap on emitted iteration records
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RECFLOW_MEMORY_LIMIT_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.memory_limit_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("RECFLOW_CHECK_INTERVAL") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.check_interval_items = v;
                }
            }
        }

        if let Ok(s) = std::env::var("RECFLOW_LARGE_ITEM_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.large_item_threshold_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("RECFLOW_MAX_ITERATIONS") {
            // 0 keeps the cap off, matching `maxIterations`.
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_iterations_cap = (v > 0).then_some(v);
            }
        }

        cfg
    }
}

/// Convert a megabyte figure from user config into bytes.
pub fn mb_to_bytes(mb: f64) -> usize {
    if !mb.is_finite() || mb <= 0.0 {
        return 0;
    }
    (mb * 1024.0 * 1024.0) as usize
}

/// Convert a kilobyte figure from user config into bytes.
pub fn kb_to_bytes(kb: f64) -> usize {
    if !kb.is_finite() || kb <= 0.0 {
        return 0;
    }
    (kb * 1024.0) as usize
}
