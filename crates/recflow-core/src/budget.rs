//! Abstract memory budget interface.
//!
//! The concrete governor lives in `recflow-mem`. Only the trait is kept here so
//! operators can be written against it without depending on the estimator.

/// Outcome of offering one item's estimated cost to a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The bytes were recorded; emit the item.
    Accepted,
    /// A periodic check found the budget exhausted; stop and keep what was produced.
    Breached,
}

/// An approximate, invocation-scoped byte counter.
///
/// Accounting is advisory: between periodic checks the counter may run past
/// the limit. Operators treat a breach as a soft stop, never as a failure.
pub trait MemoryBudget {
    /// Configured ceiling in bytes.
    fn limit_bytes(&self) -> usize;

    /// Bytes recorded so far.
    fn used_bytes(&self) -> usize;

    /// True if `used + bytes` would go past the ceiling.
    fn would_exceed(&self, bytes: usize) -> bool {
        self.used_bytes().saturating_add(bytes) > self.limit_bytes()
    }

    /// Add `bytes` to the running total.
    fn record(&mut self, bytes: usize);

    /// Count one processed item of `bytes` and check the ceiling on the
    /// configured cadence.
    fn admit(&mut self, bytes: usize) -> Admission;
}
