//! Optional observability helpers for token acquisition, requests, and pagination.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `oauth2_pager.operation` with the
//!   `operation` and `stage` fields, plus `warn` events for failed attempts and forced token
//!   refreshes.
//! - Enable `metrics` to increment the `oauth2_pager_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Client-credentials token exchange.
	TokenAcquisition,
	/// Single authorized API request.
	Request,
	/// Paginated collection fetch.
	Fetch,
	/// Authorization redirect received by the callback endpoint.
	AuthorizationCallback,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::TokenAcquisition => "token_acquisition",
			Operation::Request => "request",
			Operation::Fetch => "fetch",
			Operation::AuthorizationCallback => "authorization_callback",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure handed back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
