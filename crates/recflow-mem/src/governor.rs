//! `MemoryBudget` implementation used by the iteration operator.
//!
//! The governor never refuses an item between checks. On every
//! `check_interval`-th item it asks whether admitting that item would pass the
//! ceiling and, if so, reports a breach so the caller can stop early.

use recflow_core::budget::{Admission, MemoryBudget};
use recflow_core::config::{kb_to_bytes, mb_to_bytes, EngineConfig};
use recflow_core::options::IterationOptions;

use crate::error::{Error, Result};
use crate::tracking::PeakTracker;

/// Resolved limits for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorSettings {
    pub limit_bytes: usize,
    pub check_interval: usize,
    /// `Some` when oversized items should be dropped instead of admitted.
    pub large_item_threshold: Option<usize>,
}

impl GovernorSettings {
    pub fn unlimited() -> Self {
        Self {
            limit_bytes: usize::MAX,
            check_interval: EngineConfig::default().check_interval_items,
            large_item_threshold: None,
        }
    }

    /// Merge iteration options over engine defaults.
    pub fn resolve(opts: &IterationOptions, engine: &EngineConfig) -> Result<Self> {
        let check_interval = opts.check_interval.unwrap_or(engine.check_interval_items);
        if check_interval == 0 {
            return Err(Error::Settings("checkInterval must be positive".into()));
        }
        let limit_bytes = if opts.enable_memory_management {
            match opts.memory_limit_mb {
                Some(mb) if mb <= 0.0 || !mb.is_finite() => {
                    return Err(Error::Settings(format!(
                        "memoryLimitMB must be a positive number, got {mb}"
                    )))
                }
                Some(mb) => mb_to_bytes(mb),
                None => engine.memory_limit_bytes,
            }
        } else {
            usize::MAX
        };
        let large_item_threshold = if opts.skip_large_items {
            Some(
                opts.large_item_threshold_kb
                    .map(kb_to_bytes)
                    .unwrap_or(engine.large_item_threshold_bytes),
            )
        } else {
            None
        };
        Ok(Self {
            limit_bytes,
            check_interval,
            large_item_threshold,
        })
    }
}

/// Invocation-scoped byte counter. Single-owner, no interior mutability.
#[derive(Debug, Clone)]
pub struct MemoryGovernor {
    settings: GovernorSettings,
    used: usize,
    processed: usize,
    peak: PeakTracker,
}

impl MemoryGovernor {
    pub fn new(settings: GovernorSettings) -> Self {
        Self {
            settings,
            used: 0,
            processed: 0,
            peak: PeakTracker::new(),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(GovernorSettings::unlimited())
    }

    pub fn settings(&self) -> &GovernorSettings {
        &self.settings
    }

    /// Items offered through `admit` so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak.peak()
    }

    /// True if the item should be dropped as oversized.
    pub fn is_large(&self, bytes: usize) -> bool {
        matches!(self.settings.large_item_threshold, Some(t) if bytes > t)
    }
}

impl MemoryBudget for MemoryGovernor {
    fn limit_bytes(&self) -> usize {
        self.settings.limit_bytes
    }

    fn used_bytes(&self) -> usize {
        self.used
    }

    fn record(&mut self, bytes: usize) {
        self.used = self.used.saturating_add(bytes);
        self.peak.record_used(self.used);
    }

    fn admit(&mut self, bytes: usize) -> Admission {
        self.processed += 1;
        if self.processed % self.settings.check_interval == 0 && self.would_exceed(bytes) {
            return Admission::Breached;
        }
        self.record(bytes);
        Admission::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(limit: usize, interval: usize) -> GovernorSettings {
        GovernorSettings {
            limit_bytes: limit,
            check_interval: interval,
            large_item_threshold: None,
        }
    }

    #[test]
    fn breach_only_reported_on_check_items() {
        let mut g = MemoryGovernor::new(settings(100, 3));
        assert_eq!(g.admit(60), Admission::Accepted);
        // Over the limit, but not a check item.
        assert_eq!(g.admit(60), Admission::Accepted);
        assert_eq!(g.used_bytes(), 120);
        assert_eq!(g.admit(1), Admission::Breached);
        assert_eq!(g.used_bytes(), 120);
        assert_eq!(g.peak_bytes(), 120);
    }

    #[test]
    fn unlimited_never_breaches() {
        let mut g = MemoryGovernor::unlimited();
        for _ in 0..1000 {
            assert_eq!(g.admit(usize::MAX / 2), Admission::Accepted);
        }
        assert_eq!(g.processed(), 1000);
    }

    #[test]
    fn resolve_uses_engine_defaults() {
        let engine = EngineConfig::default();
        let opts = IterationOptions {
            enable_memory_management: true,
            skip_large_items: true,
            ..Default::default()
        };
        let s = GovernorSettings::resolve(&opts, &engine).unwrap();
        assert_eq!(s.limit_bytes, engine.memory_limit_bytes);
        assert_eq!(s.check_interval, engine.check_interval_items);
        assert_eq!(s.large_item_threshold, Some(engine.large_item_threshold_bytes));
    }

    #[test]
    fn resolve_rejects_bad_limits() {
        let engine = EngineConfig::default();
        let opts = IterationOptions {
            enable_memory_management: true,
            memory_limit_mb: Some(-1.0),
            ..Default::default()
        };
        assert!(GovernorSettings::resolve(&opts, &engine).is_err());
        let opts = IterationOptions {
            check_interval: Some(0),
            ..Default::default()
        };
        assert!(GovernorSettings::resolve(&opts, &engine).is_err());
    }

    #[test]
    fn large_items_flagged_only_when_enabled() {
        let mut s = settings(1000, 10);
        assert!(!MemoryGovernor::new(s).is_large(5000));
        s.large_item_threshold = Some(100);
        let g = MemoryGovernor::new(s);
        assert!(g.is_large(101));
        assert!(!g.is_large(100));
    }
}
