//! Client-credentials token acquisition.
//!
//! [`TokenProvider`] is the seam the client uses to mint bearer tokens; the default
//! [`ClientCredentialsProvider`] performs a single `grant_type=client_credentials` POST through any
//! [`TokenHttpClient`], sending `client_id`/`client_secret` in the form body. Providers never retry;
//! the caller decides what a failed acquisition means.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials},
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	obs::{self, Operation, OperationSpan, Outcome},
	provider::ApiDescriptor,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future returned by [`TokenProvider::acquire_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Source of bearer tokens.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Mints a new bearer token. Each call performs at most one exchange.
	fn acquire_token(&self) -> TokenFuture<'_>;
}

/// [`TokenProvider`] performing the OAuth 2.0 client-credentials grant.
pub struct ClientCredentialsProvider<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	token_endpoint: Url,
	credentials: Credentials,
	http_client: Arc<C>,
}
impl ClientCredentialsProvider<ReqwestHttpClient> {
	/// Creates a provider backed by a default reqwest transport.
	pub fn new(descriptor: &ApiDescriptor, credentials: Credentials) -> Self {
		Self::with_http_client(descriptor, credentials, ReqwestHttpClient::default())
	}
}
impl<C> ClientCredentialsProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a provider that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: &ApiDescriptor,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			token_endpoint: descriptor.token_endpoint.clone(),
			credentials,
			http_client: http_client.into(),
		}
	}

	/// Client identifier this provider authenticates as.
	pub fn client_id(&self) -> &str {
		self.credentials.client_id()
	}

	fn oauth_client(&self) -> Result<ConfiguredBasicClient> {
		let token_url = TokenUrl::new(self.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;

		Ok(BasicClient::new(ClientId::new(self.credentials.client_id().to_owned()))
			.set_client_secret(ClientSecret::new(
				self.credentials.client_secret().expose().to_owned(),
			))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url))
	}

	async fn exchange(&self) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let oauth_client = self.oauth_client()?;
		let result = oauth_client.exchange_client_credentials().request_async(&instrumented).await;
		let meta = meta.take();
		let token = match result {
			Ok(response) => response.access_token().secret().to_owned(),
			// A 200 reply only needs `access_token`; `token_type` may be missing.
			Err(RequestTokenError::Parse(source, body)) if meta_status(meta.as_ref()) == Some(200) =>
				bare_access_token(&body)
					.ok_or(TransientError::TokenResponseParse { source, status: Some(200) })?,
			Err(err) => return Err(map_request_error(meta, err)),
		};

		if token.is_empty() {
			return Err(TransientError::TokenEndpoint {
				message: "Token endpoint returned an empty access token".into(),
				status: meta_status(meta.as_ref()),
				retry_after: None,
			}
			.into());
		}

		Ok(AccessToken::new(token))
	}
}
impl<C> TokenProvider for ClientCredentialsProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn acquire_token(&self) -> TokenFuture<'_> {
		const OPERATION: Operation = Operation::TokenAcquisition;

		let span = OperationSpan::new(OPERATION, "client_credentials");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		Box::pin(async move {
			let result = span.instrument(self.exchange()).await;

			match &result {
				Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
				Err(err) => {
					obs::record_outcome(OPERATION, Outcome::Failure);
					obs::log_failure(OPERATION, err);
				},
			}

			result
		})
	}
}
impl<C> Debug for ClientCredentialsProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsProvider")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("credentials", &self.credentials)
			.finish()
	}
}

#[derive(Deserialize)]
struct BareTokenResponse {
	access_token: String,
}

fn bare_access_token(body: &[u8]) -> Option<String> {
	serde_json::from_slice::<BareTokenResponse>(body).ok().map(|response| response.access_token)
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason: message },
		_ => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_transport_error<E>(meta: Option<&ResponseMetadata>, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::token_endpoint(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "Unknown HTTP client error".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<time::Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn provider() -> ClientCredentialsProvider {
		let descriptor = ApiDescriptor::builder()
			.token_endpoint(
				Url::parse("https://api.example/oauth/token")
					.expect("Token endpoint fixture should parse."),
			)
			.api_base(Url::parse("https://api.example/v2/").expect("API base fixture should parse."))
			.build()
			.expect("Descriptor fixture should build.");
		let credentials =
			Credentials::new("client-id", "secret").expect("Credentials fixture should be valid.");

		ClientCredentialsProvider::new(&descriptor, credentials)
	}

	#[test]
	fn builds_request_body_oauth_client() {
		let provider = provider();

		assert!(provider.oauth_client().is_ok());
		assert_eq!(provider.client_id(), "client-id");
	}

	#[test]
	fn debug_output_redacts_client_secret() {
		let rendered = format!("{:?}", provider());

		assert!(rendered.contains("client-id"));
		assert!(!rendered.contains("\"secret\""));
	}

	#[test]
	fn bare_access_token_ignores_missing_token_type() {
		assert_eq!(bare_access_token(br#"{"access_token":"minted"}"#).as_deref(), Some("minted"));
		assert_eq!(bare_access_token(br#"{"token":42}"#), None);
		assert_eq!(bare_access_token(b"not json"), None);
	}

	#[test]
	fn transport_errors_map_by_kind() {
		let err = map_transport_error::<std::io::Error>(
			None,
			HttpClientError::Io(std::io::Error::other("reset")),
		);

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));

		let err = map_transport_error::<std::io::Error>(
			Some(&ResponseMetadata { status: Some(502), retry_after: None }),
			HttpClientError::Other("gateway".into()),
		);

		assert!(matches!(
			err,
			Error::Transient(TransientError::TokenEndpoint { status: Some(502), .. })
		));
	}
}
