//! Authorized GET with lazy token acquisition and a single retry.
//!
//! Every attempt observes the token generation it authorized with. When the API rejects that token
//! (401/403) the retry replaces it, unless a concurrent caller already did; the async refresh guard
//! makes sure one stale generation triggers one exchange. Other failures retry once with the same
//! token.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	client::{ApiResponse, Client},
	error::TransportError,
	obs::{self, Operation, OperationSpan, Outcome},
};

const MAX_ATTEMPTS: u8 = 2;

impl Client {
	/// Sends an authorized `GET {api_base}{path}`, retrying once on failure.
	///
	/// The first request of a client acquires the token. A 401/403 response, or a failed token
	/// acquisition, forces a refresh before the retry.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.get_with(path, &CancellationToken::new()).await
	}

	/// Same as [`get`](Self::get), aborting with [`Error::Cancelled`] once `cancellation` fires.
	pub async fn get_with(
		&self,
		path: &str,
		cancellation: &CancellationToken,
	) -> Result<ApiResponse> {
		const OPERATION: Operation = Operation::Request;

		let span = OperationSpan::new(OPERATION, "get");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span.instrument(self.get_inner(path, cancellation)).await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(Error::Cancelled) => obs::record_outcome(OPERATION, Outcome::Failure),
			Err(err) => {
				self.metrics.record_failure();
				obs::record_outcome(OPERATION, Outcome::Failure);
				obs::log_failure(OPERATION, err);
			},
		}

		result
	}

	async fn get_inner(&self, path: &str, cancellation: &CancellationToken) -> Result<ApiResponse> {
		let url = self.descriptor.resolve(path)?;
		let mut stale = None;
		let mut attempt = 1;

		loop {
			let outcome = tokio::select! {
				biased;
				_ = cancellation.cancelled() => return Err(Error::Cancelled),
				outcome = self.try_once(&url, stale) => outcome,
			};
			let failed = match outcome {
				Ok(response) => return Ok(response),
				Err(failed) => failed,
			};

			if attempt >= MAX_ATTEMPTS {
				return Err(failed.error);
			}

			stale = failed.error.is_unauthorized().then_some(failed.generation);

			obs::log_retry(
				url.as_str(),
				attempt,
				stale.is_some() || !self.has_token(),
				&failed.error,
			);

			attempt += 1;
		}
	}

	async fn try_once(&self, url: &Url, stale: Option<u64>) -> Result<ApiResponse, FailedAttempt> {
		self.metrics.record_attempt();

		let (generation, token) = self
			.bearer(stale)
			.await
			.map_err(|error| FailedAttempt { error, generation: self.tokens.snapshot().generation })?;

		self.send(url, &token).await.map_err(|error| FailedAttempt { error, generation })
	}

	/// Returns the held token, acquiring one when none is held or when `stale` names the held
	/// generation.
	async fn bearer(&self, stale: Option<u64>) -> Result<(u64, AccessToken)> {
		let current = self.tokens.snapshot();

		match current.token {
			Some(token) if stale != Some(current.generation) => Ok((current.generation, token)),
			_ => self.refresh_token(current.generation).await,
		}
	}

	/// Replaces the token of generation `stale`, or returns the replacement another caller already
	/// installed.
	async fn refresh_token(&self, stale: u64) -> Result<(u64, AccessToken)> {
		let _guard = self.tokens.refresh_guard().lock().await;
		let current = self.tokens.snapshot();

		if let Some(token) = current.token.filter(|_| current.generation != stale) {
			return Ok((current.generation, token));
		}

		self.metrics.record_token_acquisition();

		match self.token_provider.acquire_token().await {
			Ok(token) => {
				let generation = self.tokens.replace(Some(token.clone()));

				obs::log_token_installed(generation);

				Ok((generation, token))
			},
			Err(err) => {
				self.metrics.record_token_failure();
				self.tokens.replace(None);

				Err(err)
			},
		}
	}

	async fn send(&self, url: &Url, token: &AccessToken) -> Result<ApiResponse> {
		self.rate_limiter
			.schedule(async {
				let response = self
					.http_client
					.get(url.clone())
					.bearer_auth(token.expose())
					.send()
					.await
					.map_err(TransportError::api)?;
				let status = response.status();
				let final_url = response.url().clone();

				if !status.is_success() {
					return Err(Error::from_status(status.as_u16(), final_url.as_str()));
				}

				let headers = response.headers().clone();
				let body = response.bytes().await.map_err(TransportError::api)?;

				Ok(ApiResponse::new(status.as_u16(), final_url, headers, body.to_vec()))
			})
			.await
	}
}

struct FailedAttempt {
	error: Error,
	generation: u64,
}
