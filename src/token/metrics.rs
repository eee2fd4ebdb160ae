// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential refreshes.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	slow_path: AtomicU64,
	issued: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how many callers entered the refresh gate.
	pub fn gate_entries(&self) -> u64 {
		self.slow_path.load(Ordering::Relaxed)
	}

	/// Returns how many issuing calls reached the token endpoint.
	pub fn issue_calls(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns how many issuing calls failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_gate_entry(&self) {
		self.slow_path.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issue(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
