//! Progress reporting contract invoked after every fetched page.

// self
use crate::_prelude::*;

/// Receives `(records accumulated so far, expected total)` after every page.
///
/// `total` is the caller's limit for bounded fetches, otherwise the server's `x-total` header;
/// `None` when the server did not send a usable header.
pub trait ProgressReporter
where
	Self: Send + Sync,
{
	/// Reports progress for the fetch in flight.
	fn report(&self, current: usize, total: Option<usize>);
}
impl<F> ProgressReporter for F
where
	F: Fn(usize, Option<usize>) + Send + Sync,
{
	fn report(&self, current: usize, total: Option<usize>) {
		self(current, total)
	}
}

/// Reporter that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;
impl ProgressReporter for NoProgress {
	fn report(&self, _current: usize, _total: Option<usize>) {}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn closures_act_as_reporters() {
		let seen = Mutex::new(Vec::new());
		let reporter =
			|current: usize, total: Option<usize>| seen.lock().push((current, total));

		reporter.report(0, Some(3));
		reporter.report(3, Some(3));
		NoProgress.report(1, None);

		assert_eq!(*seen.lock(), vec![(0, Some(3)), (3, Some(3))]);
	}
}
