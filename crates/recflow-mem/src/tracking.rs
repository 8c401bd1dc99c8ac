//! Lightweight peak tracking for one governor.
//!
//! Keep this optional and cheap. The exec crate reports the peak per step.

#[derive(Debug, Default, Clone, Copy)]
pub struct PeakTracker {
    peak_bytes: usize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self { peak_bytes: 0 }
    }

    /// Record a new "used bytes" value; updates peak if higher.
    pub fn record_used(&mut self, used_bytes: usize) {
        if used_bytes > self.peak_bytes {
            self.peak_bytes = used_bytes;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(used_bytes, peak = self.peak_bytes, "mem usage");
    }

    pub fn peak(&self) -> usize {
        self.peak_bytes
    }
}
