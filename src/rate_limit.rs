//! Admission gate bounding concurrency and dispatch pacing for every outbound API request.
//!
//! A [`RateLimiter`] is a cheap handle onto shared state: clones, and every client handed the same
//! handle, draw from one pool of concurrency slots and one dispatch clock. Clients built without an
//! explicit limiter use [`RateLimiter::shared`], the process-wide default gate.

// std
use std::{
	sync::{
		OnceLock,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use governor::{
	Quota, RateLimiter as GovernorRateLimiter,
	clock::DefaultClock,
	state::{InMemoryState, NotKeyed},
};
// self
use crate::_prelude::*;

static SHARED: OnceLock<RateLimiter> = OnceLock::new();

type DispatchClock = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Errors raised while validating a [`RateLimitConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RateLimitConfigError {
	/// At least one request must be allowed in flight.
	#[error("The max_concurrent value must be at least 1.")]
	ZeroConcurrency,
}

/// Concurrency ceiling and minimum spacing between request dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
	/// Maximum number of requests executing at once.
	pub max_concurrent: usize,
	/// Minimum time between two consecutive dispatches.
	#[serde(rename = "min_interval_ms", with = "millis")]
	pub min_interval: Duration,
}
impl RateLimitConfig {
	/// Default concurrency ceiling.
	pub const DEFAULT_MAX_CONCURRENT: usize = 2;
	/// Default dispatch spacing.
	pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

	/// Creates a configuration with explicit values.
	pub const fn new(max_concurrent: usize, min_interval: Duration) -> Self {
		Self { max_concurrent, min_interval }
	}

	fn validate(&self) -> Result<(), RateLimitConfigError> {
		if self.max_concurrent == 0 {
			return Err(RateLimitConfigError::ZeroConcurrency);
		}

		Ok(())
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_CONCURRENT, Self::DEFAULT_MIN_INTERVAL)
	}
}

/// Shared handle onto an admission gate.
///
/// [`schedule`](Self::schedule) waits for a free concurrency slot, then for the dispatch clock,
/// then runs the task while holding the slot. The task's output is returned untouched; dropping the
/// returned future at any point releases whatever it held.
#[derive(Clone)]
pub struct RateLimiter(Arc<Gate>);
impl RateLimiter {
	/// Creates a private gate from a validated configuration.
	pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitConfigError> {
		config.validate()?;

		Ok(Self::from_valid(config))
	}

	/// Returns the process-wide gate, created with [`RateLimitConfig::default`] on first use.
	pub fn shared() -> Self {
		SHARED.get_or_init(|| Self::from_valid(RateLimitConfig::default())).clone()
	}

	fn from_valid(config: RateLimitConfig) -> Self {
		Self(Arc::new(Gate {
			config,
			slots: Semaphore::new(config.max_concurrent),
			// A zero interval never needs pacing.
			dispatch: Quota::with_period(config.min_interval).map(DispatchClock::direct),
			in_flight: AtomicUsize::new(0),
		}))
	}

	/// Configuration the gate enforces.
	pub fn config(&self) -> RateLimitConfig {
		self.0.config
	}

	/// Number of tasks currently executing inside the gate.
	pub fn in_flight(&self) -> usize {
		self.0.in_flight.load(Ordering::Acquire)
	}

	/// Returns `true` when both handles point at the same gate.
	pub fn same_gate(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Runs `task` once a concurrency slot and the dispatch interval allow it.
	pub async fn schedule<F, T>(&self, task: F) -> T
	where
		F: Future<Output = T>,
	{
		let _slot = self.0.slots.acquire().await;

		if let Some(dispatch) = &self.0.dispatch {
			dispatch.until_ready().await;
		}

		let _in_flight = InFlight::enter(&self.0.in_flight);

		task.await
	}

}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("config", &self.0.config)
			.field("in_flight", &self.in_flight())
			.finish()
	}
}

struct Gate {
	config: RateLimitConfig,
	slots: Semaphore,
	dispatch: Option<DispatchClock>,
	in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);
impl<'a> InFlight<'a> {
	fn enter(counter: &'a AtomicUsize) -> Self {
		counter.fetch_add(1, Ordering::AcqRel);

		Self(counter)
	}
}
impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::AcqRel);
	}
}

mod millis {
	// std
	use std::time::Duration;
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};

	pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}
