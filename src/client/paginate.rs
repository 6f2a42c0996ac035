//! Sequential page walk over collection endpoints.

// self
use crate::{
	_prelude::*,
	client::Client,
	ext::{NoProgress, ProgressReporter},
	obs::{self, Operation, OperationSpan, Outcome},
};

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used for a fetch bounded by `limit` (`0` means unbounded).
pub fn page_size(limit: usize) -> usize {
	if limit > 0 && limit < MAX_PAGE_SIZE { limit } else { MAX_PAGE_SIZE }
}

/// Appends the page parameters to `path`, keeping any query it already carries.
pub fn page_path(path: &str, size: usize, number: usize) -> String {
	let separator = if path.contains('?') { '&' } else { '?' };

	format!("{path}{separator}page[size]={size}&page[number]={number}")
}

/// Knobs for [`Client::fetch_with`].
#[derive(Clone)]
pub struct FetchOptions {
	limit: usize,
	progress: Arc<dyn ProgressReporter>,
	cancellation: CancellationToken,
}
impl FetchOptions {
	/// Unbounded fetch without progress reporting or cancellation.
	pub fn new() -> Self {
		Self {
			limit: 0,
			progress: Arc::new(NoProgress),
			cancellation: CancellationToken::new(),
		}
	}

	/// Caps the number of returned records; `0` keeps the fetch unbounded.
	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = limit;

		self
	}

	/// Receives `(accumulated, total)` after every page.
	pub fn progress(mut self, reporter: impl 'static + ProgressReporter) -> Self {
		self.progress = Arc::new(reporter);

		self
	}

	/// Stops the walk once `cancellation` fires, keeping the pages already received.
	pub fn cancellation(mut self, cancellation: CancellationToken) -> Self {
		self.cancellation = cancellation;

		self
	}
}
impl Default for FetchOptions {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for FetchOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchOptions")
			.field("limit", &self.limit)
			.field("cancelled", &self.cancellation.is_cancelled())
			.finish()
	}
}

/// How a fetch ended.
#[derive(Debug)]
pub enum FetchStatus {
	/// Every requested record was received.
	Complete,
	/// A page request failed; later pages were not requested.
	Aborted(Error),
	/// The caller cancelled the fetch.
	Cancelled,
}

/// Records accumulated by a fetch, in server order, and how the fetch ended.
///
/// Records received before a failure or cancellation are kept.
#[derive(Debug)]
pub struct Fetched<T> {
	/// Accumulated records, never more than the requested limit.
	pub records: Vec<T>,
	/// Terminal status of the walk.
	pub status: FetchStatus,
}
impl<T> Fetched<T> {
	fn new(records: Vec<T>, status: FetchStatus) -> Self {
		Self { records, status }
	}

	/// Returns `true` when no page failed and the fetch was not cancelled.
	pub fn is_complete(&self) -> bool {
		matches!(self.status, FetchStatus::Complete)
	}

	/// Drops the status and returns whatever was accumulated.
	pub fn into_records(self) -> Vec<T> {
		self.records
	}

	/// Returns the records of a complete fetch, or the error that ended it early.
	pub fn into_result(self) -> Result<Vec<T>> {
		match self.status {
			FetchStatus::Complete => Ok(self.records),
			FetchStatus::Aborted(err) => Err(err),
			FetchStatus::Cancelled => Err(Error::Cancelled),
		}
	}
}

impl Client {
	/// Fetches every page of `path`, stopping at `limit` records (`0` means unbounded).
	pub async fn fetch<T>(&self, path: &str, limit: usize) -> Fetched<T>
	where
		T: DeserializeOwned,
	{
		self.fetch_with(path, FetchOptions::new().limit(limit)).await
	}

	/// Fetches pages of `path` one at a time as configured by `options`.
	///
	/// The walk stops after the first empty page, once the limit is reached, or once the `x-total`
	/// announced by the server has been received. Without an `x-total` header, a page shorter than
	/// the page size also ends the walk.
	///
	/// Progress is reported after each page is appended, so the first report already counts the
	/// records of page 1 (for example `(100, Some(250))`) rather than starting at `(0, total)`.
	pub async fn fetch_with<T>(&self, path: &str, options: FetchOptions) -> Fetched<T>
	where
		T: DeserializeOwned,
	{
		const OPERATION: Operation = Operation::Fetch;

		let span = OperationSpan::new(OPERATION, "fetch");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let fetched = span.instrument(self.walk_pages(path, options)).await;

		match &fetched.status {
			FetchStatus::Complete => obs::record_outcome(OPERATION, Outcome::Success),
			FetchStatus::Aborted(err) => {
				obs::record_outcome(OPERATION, Outcome::Failure);
				obs::log_failure(OPERATION, err);
			},
			FetchStatus::Cancelled => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		fetched
	}

	async fn walk_pages<T>(&self, path: &str, options: FetchOptions) -> Fetched<T>
	where
		T: DeserializeOwned,
	{
		let FetchOptions { limit, progress, cancellation } = options;
		let size = page_size(limit);
		let mut records = Vec::new();
		let mut number = 1;

		loop {
			let page = match self.get_with(&page_path(path, size, number), &cancellation).await {
				Ok(response) => response.json::<Vec<T>>().map(|page| (page, response.total())),
				Err(err) => Err(err),
			};
			let (page, announced) = match page {
				Ok(page) => page,
				Err(Error::Cancelled) => return Fetched::new(records, FetchStatus::Cancelled),
				Err(err) => return Fetched::new(records, FetchStatus::Aborted(err)),
			};
			let received = page.len();
			let total = if limit > 0 { Some(limit) } else { announced };

			records.extend(page);

			if limit > 0 {
				records.truncate(limit);
			}

			progress.report(records.len(), total);

			// A short page only marks the end when the server does not announce a total.
			let exhausted = match announced {
				Some(announced) => records.len() >= announced,
				None => received < size,
			};

			if received == 0 || exhausted || (limit > 0 && records.len() >= limit) {
				return Fetched::new(records, FetchStatus::Complete);
			}

			number += 1;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn page_size_follows_limit_below_the_maximum() {
		assert_eq!(page_size(0), MAX_PAGE_SIZE);
		assert_eq!(page_size(1), 1);
		assert_eq!(page_size(42), 42);
		assert_eq!(page_size(99), 99);
		assert_eq!(page_size(100), MAX_PAGE_SIZE);
		assert_eq!(page_size(250), MAX_PAGE_SIZE);
	}

	#[test]
	fn page_path_picks_the_query_separator() {
		assert_eq!(page_path("users", 100, 1), "users?page[size]=100&page[number]=1");
		assert_eq!(
			page_path("campus/1/users?filter[active]=true", 10, 3),
			"campus/1/users?filter[active]=true&page[size]=10&page[number]=3"
		);
	}

	#[test]
	fn fetched_keeps_partial_records() {
		let fetched =
			Fetched::new(vec![1, 2, 3], FetchStatus::Aborted(Error::from_status(500, "u")));

		assert!(!fetched.is_complete());
		assert!(matches!(fetched.into_result(), Err(Error::Status { status: 500, .. })));

		let cancelled = Fetched::new(vec![1], FetchStatus::Cancelled);

		assert_eq!(cancelled.into_records(), vec![1]);
		assert!(Fetched::new(Vec::<u8>::new(), FetchStatus::Complete).is_complete());
	}
}
