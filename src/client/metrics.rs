// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for request attempts and token acquisitions.
#[derive(Debug, Default)]
pub struct RequestMetrics {
	attempts: AtomicU64,
	failures: AtomicU64,
	token_acquisitions: AtomicU64,
	token_failures: AtomicU64,
}
impl RequestMetrics {
	/// Returns the number of HTTP attempts, including retries.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that failed after exhausting their retry.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of token endpoint exchanges started.
	pub fn token_acquisitions(&self) -> u64 {
		self.token_acquisitions.load(Ordering::Relaxed)
	}

	/// Returns the number of token endpoint exchanges that failed.
	pub fn token_failures(&self) -> u64 {
		self.token_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_token_acquisition(&self) {
		self.token_acquisitions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_token_failure(&self) {
		self.token_failures.fetch_add(1, Ordering::Relaxed);
	}
}
