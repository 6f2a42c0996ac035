//! Client-level error types shared across token acquisition, requests, and pagination.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; safe to retry.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the client credentials.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// API rejected the bearer token (401/403).
	#[error("API rejected the bearer token with HTTP {status} for {url}.")]
	Unauthorized {
		/// HTTP status code.
		status: u16,
		/// Request URL.
		url: String,
	},
	/// API answered with another non-success status.
	#[error("API returned HTTP {status} for {url}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Request URL.
		url: String,
	},
	/// Caller cancelled the operation.
	#[error("Operation was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the failure indicates the held token must be replaced.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}

	/// Maps an HTTP status into the matching API error variant.
	pub(crate) fn from_status(status: u16, url: impl Into<String>) -> Self {
		let url = url.into();

		match status {
			401 | 403 => Self::Unauthorized { status, url },
			_ => Self::Status { status, url },
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint cannot be handed to the OAuth client.
	#[error("Descriptor contains an invalid token endpoint.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Request path cannot be joined onto the API base URL.
	#[error("Request path `{path}` cannot be joined onto the API base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path resolves outside the API base URL.
	#[error("Request path `{path}` resolves outside the API base URL.")]
	PathOutsideApiBase {
		/// Offending path.
		path: String,
	},
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<time::Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// API responded with a body that does not match the expected shape.
	#[error("API response from {url} could not be decoded.")]
	ResponseParse {
		/// Request URL.
		url: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which endpoint was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a network error raised while calling the token endpoint.
	pub fn token_endpoint(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the token endpoint", source: Box::new(src) }
	}

	/// Wraps a network error raised while calling the API.
	pub fn api(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the API", source: Box::new(src) }
	}
}
