//! HTTP plumbing shared by token exchanges and API requests.
//!
//! Token exchanges run through [`TokenHttpClient`], a seam that lets callers swap the transport
//! while still reporting the response status and `Retry-After` hint through a
//! [`ResponseMetadataSlot`]. API requests always use [`ReqwestHttpClient`] directly.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc2822};
// self
use crate::_prelude::*;

/// Transport able to perform token exchanges on behalf of a
/// [`ClientCredentialsProvider`](crate::oauth::ClientCredentialsProvider).
///
/// Every exchange asks for a fresh handle bound to its own [`ResponseMetadataSlot`]. A handle
/// clears the slot before sending and fills it as soon as a status line arrives, so error mapping
/// can tell a rejected exchange from a network failure.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error produced by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-exchange [`AsyncHttpClient`] handle.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that reports into `slot`.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Status and back-off hint of the last token endpoint response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, once a response arrived.
	pub status: Option<u16>,
	/// Delay requested through `Retry-After`.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Captures `status` together with the `Retry-After` hint found in `headers`.
	pub fn from_response(status: u16, headers: &HeaderMap) -> Self {
		Self { status: Some(status), retry_after: parse_retry_after(headers) }
	}
}

/// Shared cell through which a handle hands [`ResponseMetadata`] back to the provider.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Overwrites the slot with `meta`.
	pub fn store(&self, meta: ResponseMetadata) {
		self.0.lock().replace(meta);
	}

	/// Empties the slot, returning what it held.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Reqwest client used for every API request and, by default, for token exchanges.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps a preconfigured reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestExchange;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestExchange { client: self.0.clone(), slot }
	}
}

/// Token exchange handle produced by [`ReqwestHttpClient`].
///
/// Requests leave with `Accept: */*`, which the token endpoint expects.
#[derive(Clone)]
pub struct ReqwestExchange {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl ReqwestExchange {
	async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ReqwestError> {
		request.headers_mut().insert(ACCEPT, HeaderValue::from_static("*/*"));

		self.slot.take();

		let request = reqwest::Request::try_from(request)?;
		let response = self.client.execute(request).await?;
		let status = response.status();
		let headers = response.headers().clone();

		self.slot.store(ResponseMetadata::from_response(status.as_u16(), &headers));

		let body = response.bytes().await?;
		let mut reply = HttpResponse::new(body.to_vec());

		*reply.status_mut() = status;
		*reply.headers_mut() = headers;

		Ok(reply)
	}
}
impl<'c> AsyncHttpClient<'c> for ReqwestExchange {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.execute(request).await.map_err(|err| HttpClientError::Reqwest(Box::new(err)))
		})
	}
}

/// Reads `Retry-After` as delta-seconds or an RFC 2822 date; past dates yield `None`.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	match raw.parse::<i64>() {
		Ok(seconds) if seconds >= 0 => Some(Duration::seconds(seconds)),
		Ok(_) => None,
		Err(_) => OffsetDateTime::parse(raw, &Rfc2822)
			.ok()
			.map(|moment| moment - OffsetDateTime::now_utc())
			.filter(|delay| delay.is_positive()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn headers(retry_after: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static(retry_after));

		headers
	}

	#[test]
	fn retry_after_reads_delta_seconds() {
		assert_eq!(parse_retry_after(&headers("12")), Some(Duration::seconds(12)));
		assert_eq!(parse_retry_after(&headers(" 3 ")), Some(Duration::seconds(3)));
	}

	#[test]
	fn retry_after_discards_past_dates_and_garbage() {
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
		assert_eq!(parse_retry_after(&headers("Wed, 21 Oct 2015 07:28:00 GMT")), None);
		assert_eq!(parse_retry_after(&headers("soon")), None);
		assert_eq!(parse_retry_after(&headers("-5")), None);
	}

	#[test]
	fn metadata_captures_status_and_hint() {
		let meta = ResponseMetadata::from_response(429, &headers("7"));

		assert_eq!(meta.status, Some(429));
		assert_eq!(meta.retry_after, Some(Duration::seconds(7)));
	}

	#[test]
	fn slot_hands_metadata_over_once() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(503), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(503));
		assert_eq!(slot.take(), None);
	}
}
