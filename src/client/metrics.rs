//! Always-on pipeline outcome counters.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::RequestOutcome;

/// Thread-safe counters for pipeline outcomes, available without any metrics recorder.
#[derive(Debug, Default)]
pub struct RequestMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	duplicate: AtomicU64,
	expired: AtomicU64,
}
impl RequestMetrics {
	/// Returns the total number of calls that entered the pipeline.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of normalized successes.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of classified or transport failures.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of duplicate rejections.
	pub fn duplicates(&self) -> u64 {
		self.duplicate.load(Ordering::Relaxed)
	}

	/// Returns the number of calls refused because the stored token was unusable.
	pub fn expired(&self) -> u64 {
		self.expired.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: RequestOutcome) {
		let counter = match outcome {
			RequestOutcome::Attempt => &self.attempts,
			RequestOutcome::Success => &self.success,
			RequestOutcome::Failure => &self.failure,
			RequestOutcome::Duplicate => &self.duplicate,
			RequestOutcome::Expired => &self.expired,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
