//! Authorized, rate-limited API client and its paginated fetcher.
//!
//! [`Client`] owns one bearer token cell, a handle onto a shared [`RateLimiter`], and a
//! [`TokenProvider`]. [`Client::get`] performs a single authorized GET with at most one retry;
//! [`Client::fetch`] walks a collection page by page on top of it.

pub mod paginate;
pub mod response;

mod metrics;
mod request;
mod token;

pub use metrics::RequestMetrics;
pub use paginate::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	http::ReqwestHttpClient,
	oauth::{ClientCredentialsProvider, TokenProvider},
	provider::ApiDescriptor,
	rate_limit::RateLimiter,
};
use token::TokenCell;

/// Client for a paginated REST API authenticated with client-credentials bearer tokens.
///
/// Clones share the token cell, metrics, and rate limiter, so a clone behaves like the original.
/// Distinct clients built with [`Client::new`] share the process-wide rate limiter but each mint
/// their own token.
#[derive(Clone)]
pub struct Client {
	/// Descriptor naming the token endpoint and API base.
	pub descriptor: ApiDescriptor,
	/// HTTP client used for every API request.
	pub http_client: ReqwestHttpClient,
	/// Source of bearer tokens.
	pub token_provider: Arc<dyn TokenProvider>,
	/// Admission gate every API request passes through.
	pub rate_limiter: RateLimiter,
	/// Shared request and token counters.
	pub metrics: Arc<RequestMetrics>,
	tokens: Arc<TokenCell>,
}
impl Client {
	/// Creates a client using the client-credentials grant, a default reqwest transport, and the
	/// process-wide rate limiter.
	pub fn new(descriptor: ApiDescriptor, credentials: Credentials) -> Self {
		let http_client = ReqwestHttpClient::default();
		let token_provider: Arc<dyn TokenProvider> = Arc::new(
			<ClientCredentialsProvider>::with_http_client(&descriptor, credentials, http_client.clone()),
		);

		Self::with_token_provider(descriptor, token_provider, http_client, RateLimiter::shared())
	}

	/// Creates a client from explicit collaborators.
	pub fn with_token_provider(
		descriptor: ApiDescriptor,
		token_provider: Arc<dyn TokenProvider>,
		http_client: ReqwestHttpClient,
		rate_limiter: RateLimiter,
	) -> Self {
		Self {
			descriptor,
			http_client,
			token_provider,
			rate_limiter,
			metrics: Default::default(),
			tokens: Default::default(),
		}
	}

	/// Routes this client's requests through `rate_limiter` instead.
	pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
		self.rate_limiter = rate_limiter;

		self
	}

	/// Returns `true` while a bearer token is held.
	pub fn has_token(&self) -> bool {
		self.tokens.snapshot().token.is_some()
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("descriptor", &self.descriptor)
			.field("rate_limiter", &self.rate_limiter)
			.field("token_held", &self.has_token())
			.finish()
	}
}
