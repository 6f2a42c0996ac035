//! Rate-limited, paginated REST client with self-refreshing OAuth 2.0 client-credentials tokens,
//! plus a one-shot callback receiver for interactive authorization redirects.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
#[cfg(feature = "callback")] pub mod callback;
pub mod client;
pub mod error;
pub mod ext;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod rate_limit;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		auth::{AccessToken, Credentials},
		client::Client,
		http::ReqwestHttpClient,
		oauth::{ClientCredentialsProvider, TokenFuture, TokenProvider},
		provider::ApiDescriptor,
		rate_limit::{RateLimitConfig, RateLimiter},
	};

	/// Token provider minting `token-1`, `token-2`, ... without any network traffic.
	#[derive(Debug, Default)]
	pub struct SequenceTokenProvider(AtomicUsize);
	impl SequenceTokenProvider {
		/// Number of tokens minted so far.
		pub fn calls(&self) -> usize {
			self.0.load(Ordering::SeqCst)
		}
	}
	impl TokenProvider for SequenceTokenProvider {
		fn acquire_token(&self) -> TokenFuture<'_> {
			let call = self.0.fetch_add(1, Ordering::SeqCst) + 1;

			Box::pin(async move { Ok(AccessToken::new(format!("token-{call}"))) })
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a private rate limiter without dispatch spacing so tests do not share the
	/// process-wide gate or wait on it.
	pub fn unthrottled_rate_limiter(max_concurrent: usize) -> RateLimiter {
		RateLimiter::new(RateLimitConfig::new(max_concurrent, std::time::Duration::ZERO))
			.expect("Test rate limit configuration should be valid.")
	}

	/// Builds a descriptor whose token endpoint and API base both live on `base_url`.
	pub fn test_descriptor(base_url: &str) -> ApiDescriptor {
		ApiDescriptor::builder()
			.token_endpoint(
				Url::parse(&format!("{base_url}/oauth/token"))
					.expect("Mock token endpoint should parse successfully."),
			)
			.api_base(
				Url::parse(&format!("{base_url}/v2/"))
					.expect("Mock API base should parse successfully."),
			)
			.build()
			.expect("Test descriptor should build successfully.")
	}

	/// Constructs a [`Client`] backed by the reqwest client-credentials provider, an insecure
	/// reqwest transport, and a private unthrottled rate limiter.
	pub fn build_reqwest_test_client(
		descriptor: ApiDescriptor,
		client_id: &str,
		client_secret: &str,
	) -> Client {
		let credentials = Credentials::new(client_id, client_secret)
			.expect("Test credentials should be considered valid.");
		let http_client = test_reqwest_http_client();
		let provider: Arc<dyn TokenProvider> = Arc::new(<ClientCredentialsProvider>::with_http_client(
			&descriptor,
			credentials,
			http_client.clone(),
		));

		Client::with_token_provider(descriptor, provider, http_client, unthrottled_rate_limiter(2))
	}

	/// Constructs a [`Client`] for `base_url` whose tokens come from `provider`.
	pub fn build_sequence_test_client(base_url: &str, provider: Arc<SequenceTokenProvider>) -> Client {
		Client::with_token_provider(
			test_descriptor(base_url),
			provider,
			test_reqwest_http_client(),
			unthrottled_rate_limiter(2),
		)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, Semaphore};
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tower as _};
