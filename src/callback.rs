//! One-shot HTTP receiver for the OAuth authorization-code redirect.
//!
//! [`router`] serves `GET {path}` and hands a received code to an [`AuthorizationResolver`].
//! [`CallbackServer`] binds that router to `127.0.0.1` and shuts it down gracefully once the first
//! code has been delivered.
//!
//! Responses mirror what the browser-side flow expects: with a redirect URL configured every
//! outcome becomes a `302` carrying `status` (and `error`/`error_description` on failure) in the
//! query; without one the endpoint answers `200`, `400`, or `401` with a short text body.

// std
use std::{io, net::SocketAddr, time::Duration};
// crates.io
use axum::{
	Router,
	extract::{Query, State},
	http::{HeaderName, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::cors::{Any, CorsLayer};
// self
use crate::{
	_prelude::*,
	ext::{AuthorizationProcessId, AuthorizationResolver, OneshotResolver},
	obs::{self, Operation, Outcome},
};

const NO_CODE_DESCRIPTION: &str = "No code was provided by the authorization server";

/// Failures raised while running the callback endpoint.
#[derive(Debug, ThisError)]
pub enum CallbackError {
	/// The listening socket could not be opened.
	#[error("Callback endpoint could not listen on {addr}.")]
	Bind {
		/// Requested address.
		addr: SocketAddr,
		/// Underlying socket failure.
		#[source]
		source: io::Error,
	},
	/// No code arrived before the deadline.
	#[error("No authorization callback arrived within {0:?}.")]
	TimedOut(Duration),
	/// The endpoint stopped before delivering a code.
	#[error("Callback endpoint stopped before receiving a code.")]
	Closed,
}

/// Where the callback endpoint listens and where browsers are sent afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
	/// Local port; `0` lets the OS pick one.
	pub port: u16,
	/// Route serving the redirect.
	pub path: String,
	/// Page the browser is redirected to after every callback, if any.
	pub redirect_url: Option<Url>,
}
impl CallbackConfig {
	/// Route used when none is configured.
	pub const DEFAULT_PATH: &'static str = "/callback";

	/// Listens on `port` at [`DEFAULT_PATH`](Self::DEFAULT_PATH) without redirecting.
	pub fn new(port: u16) -> Self {
		Self { port, path: Self::DEFAULT_PATH.into(), redirect_url: None }
	}

	/// Serves the redirect at `path` instead.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();

		self
	}

	/// Sends browsers to `redirect_url` after every callback.
	pub fn with_redirect_url(mut self, redirect_url: Url) -> Self {
		self.redirect_url = Some(redirect_url);

		self
	}

	fn route(&self) -> String {
		if self.path.starts_with('/') { self.path.clone() } else { format!("/{}", self.path) }
	}
}
impl Default for CallbackConfig {
	fn default() -> Self {
		Self::new(0)
	}
}

/// Builds the callback router for one pending authorization process.
pub fn router(
	config: &CallbackConfig,
	resolver: Arc<dyn AuthorizationResolver>,
	process_id: AuthorizationProcessId,
) -> Router {
	let cors = CorsLayer::new().allow_origin(Any).allow_headers([
		header::ORIGIN,
		HeaderName::from_static("x-requested-with"),
		header::CONTENT_TYPE,
		header::ACCEPT,
	]);
	let state = Arc::new(CallbackState {
		redirect_url: config.redirect_url.clone(),
		resolver,
		process_id,
	});

	Router::new().route(&config.route(), get(handle_callback)).layer(cors).with_state(state)
}

/// Callback endpoint that serves until the first authorization code arrives.
#[derive(Clone, Debug)]
pub struct CallbackServer {
	config: CallbackConfig,
}
impl CallbackServer {
	/// Creates a server for `config`.
	pub fn new(config: CallbackConfig) -> Self {
		Self { config }
	}

	/// Binds `127.0.0.1:{port}` and starts serving in the background.
	///
	/// Codes are forwarded to `resolver` as well as to the returned handle.
	pub async fn start(
		self,
		resolver: Arc<dyn AuthorizationResolver>,
		process_id: AuthorizationProcessId,
	) -> Result<CallbackHandle, CallbackError> {
		let shutdown = CancellationToken::new();
		let (delivered, code_rx) = OneshotResolver::channel();
		let resolver =
			Arc::new(ShutdownOnResolve { inner: resolver, delivered, shutdown: shutdown.clone() });
		let app = router(&self.config, resolver, process_id);
		let addr = SocketAddr::from(([127, 0, 0, 1], self.config.port));
		let listener =
			TcpListener::bind(addr).await.map_err(|source| CallbackError::Bind { addr, source })?;
		let local_addr =
			listener.local_addr().map_err(|source| CallbackError::Bind { addr, source })?;

		obs::log_listening(&local_addr);

		let server_shutdown = shutdown.clone();

		tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app)
				.with_graceful_shutdown(server_shutdown.cancelled_owned())
				.await
			{
				obs::log_failure(Operation::AuthorizationCallback, &err);
			}
		});

		Ok(CallbackHandle { local_addr, route: self.config.route(), code_rx, shutdown })
	}
}

/// Running callback endpoint. Dropping the handle stops the server.
#[derive(Debug)]
pub struct CallbackHandle {
	local_addr: SocketAddr,
	route: String,
	code_rx: oneshot::Receiver<(AuthorizationProcessId, String)>,
	shutdown: CancellationToken,
}
impl CallbackHandle {
	/// Address the endpoint is bound to.
	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// URL to register as the OAuth redirect URI.
	pub fn callback_url(&self) -> String {
		format!("http://{}{}", self.local_addr, self.route)
	}

	/// Waits up to `timeout` for the authorization code, then stops the server.
	pub async fn wait(
		mut self,
		timeout: Duration,
	) -> Result<(AuthorizationProcessId, String), CallbackError> {
		let received = tokio::time::timeout(timeout, &mut self.code_rx).await;

		self.shutdown.cancel();

		match received {
			Ok(Ok(delivery)) => Ok(delivery),
			Ok(Err(_)) => Err(CallbackError::Closed),
			Err(_) => Err(CallbackError::TimedOut(timeout)),
		}
	}

	/// Stops the server without waiting for a code.
	pub fn shutdown(self) {
		self.shutdown.cancel();
	}
}
impl Drop for CallbackHandle {
	fn drop(&mut self) {
		self.shutdown.cancel();
	}
}

struct CallbackState {
	redirect_url: Option<Url>,
	resolver: Arc<dyn AuthorizationResolver>,
	process_id: AuthorizationProcessId,
}

struct ShutdownOnResolve {
	inner: Arc<dyn AuthorizationResolver>,
	delivered: OneshotResolver,
	shutdown: CancellationToken,
}
impl AuthorizationResolver for ShutdownOnResolve {
	fn resolve(&self, process_id: AuthorizationProcessId, code: String) {
		self.inner.resolve(process_id, code.clone());
		self.delivered.resolve(process_id, code);
		self.shutdown.cancel();
	}
}

#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
	code: Option<String>,
	error: Option<String>,
	error_description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum CallbackOutcome {
	Denied { error: String, description: String },
	Code(String),
	Missing,
}
impl From<CallbackParams> for CallbackOutcome {
	fn from(params: CallbackParams) -> Self {
		let present = |value: Option<String>| value.filter(|value| !value.is_empty());

		if let Some(error) = present(params.error) {
			return Self::Denied { error, description: params.error_description.unwrap_or_default() };
		}

		match present(params.code) {
			Some(code) => Self::Code(code),
			None => Self::Missing,
		}
	}
}

async fn handle_callback(
	State(state): State<Arc<CallbackState>>,
	Query(params): Query<CallbackParams>,
) -> Response {
	const OPERATION: Operation = Operation::AuthorizationCallback;

	obs::record_outcome(OPERATION, Outcome::Attempt);

	let redirect_url = state.redirect_url.as_ref();

	match CallbackOutcome::from(params) {
		CallbackOutcome::Denied { error, description } => {
			obs::record_outcome(OPERATION, Outcome::Failure);
			obs::log_failure(OPERATION, &format!("{error}: {description}"));

			match redirect_url {
				Some(url) => found(
					url,
					&[
						("status", "error"),
						("error", error.as_str()),
						("error_description", description.as_str()),
					],
				),
				None => (StatusCode::UNAUTHORIZED, format!("Unable to log in: {description}"))
					.into_response(),
			}
		},
		CallbackOutcome::Code(code) => {
			state.resolver.resolve(state.process_id, code);
			obs::record_outcome(OPERATION, Outcome::Success);

			match redirect_url {
				Some(url) => found(url, &[("status", "success")]),
				None => (StatusCode::OK, "Successfully logged in").into_response(),
			}
		},
		CallbackOutcome::Missing => {
			obs::record_outcome(OPERATION, Outcome::Failure);
			obs::log_failure(OPERATION, &NO_CODE_DESCRIPTION);

			match redirect_url {
				Some(url) => found(
					url,
					&[
						("status", "error"),
						("error", "no-code"),
						("error_description", NO_CODE_DESCRIPTION),
					],
				),
				None => (StatusCode::BAD_REQUEST, format!("Unable to log in: {NO_CODE_DESCRIPTION}"))
					.into_response(),
			}
		},
	}
}

fn found(base: &Url, pairs: &[(&str, &str)]) -> Response {
	let mut location = base.clone();

	location.query_pairs_mut().extend_pairs(pairs);

	(StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
