// crates.io
use httpmock::prelude::*;
// self
use oauth2_pager::{_preludet::*, error::TransientError};

const CLIENT_ID: &str = "pager-client";
const CLIENT_SECRET: &str = "pager-secret";

#[tokio::test]
async fn first_request_acquires_token_and_later_requests_reuse_it() {
	let server = MockServer::start_async().await;
	let client =
		build_reqwest_test_client(test_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"lazy-token\",\"token_type\":\"bearer\",\"expires_in\":7200}");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/campus").header("authorization", "Bearer lazy-token");
			then.status(200).header("content-type", "application/json").body("[{\"id\":1}]");
		})
		.await;

	assert!(!client.has_token());

	let first = client.get("campus").await.expect("First request should succeed.");
	let second = client.get("/campus").await.expect("Leading slash should be tolerated.");

	assert_eq!(first.status(), 200);
	assert_eq!(second.body(), b"[{\"id\":1}]");
	assert!(client.has_token());

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(2).await;

	assert_eq!(client.metrics.attempts(), 2);
	assert_eq!(client.metrics.token_acquisitions(), 1);
}

#[tokio::test]
async fn unauthorized_response_refreshes_once_and_retries() {
	let server = MockServer::start_async().await;
	let provider = Arc::new(SequenceTokenProvider::default());
	let client = build_sequence_test_client(&server.base_url(), provider.clone());
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users").header("authorization", "Bearer token-1");
			then.status(401);
		})
		.await;
	let refreshed = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users").header("authorization", "Bearer token-2");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let response = client.get("users").await.expect("Retry with a fresh token should succeed.");

	assert_eq!(response.status(), 200);

	expired.assert_calls_async(1).await;
	refreshed.assert_calls_async(1).await;

	assert_eq!(provider.calls(), 2);
	assert_eq!(client.metrics.attempts(), 2);
	assert_eq!(client.metrics.failures(), 0);
}

#[tokio::test]
async fn persistent_unauthorized_returns_error_after_two_attempts() {
	let server = MockServer::start_async().await;
	let provider = Arc::new(SequenceTokenProvider::default());
	let client = build_sequence_test_client(&server.base_url(), provider.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users");
			then.status(403);
		})
		.await;
	let err = client.get("users").await.expect_err("Forbidden responses must surface.");

	assert!(matches!(err, Error::Unauthorized { status: 403, .. }));

	mock.assert_calls_async(2).await;

	assert_eq!(provider.calls(), 2);
	assert_eq!(client.metrics.failures(), 1);
}

#[tokio::test]
async fn other_failures_retry_without_refreshing() {
	let server = MockServer::start_async().await;
	let provider = Arc::new(SequenceTokenProvider::default());
	let client = build_sequence_test_client(&server.base_url(), provider.clone());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/missing").header("authorization", "Bearer token-1");
			then.status(404);
		})
		.await;
	let err = client.get("missing").await.expect_err("Missing resources must surface.");

	match err {
		Error::Status { status, url } => {
			assert_eq!(status, 404);
			assert!(url.ends_with("/v2/missing"));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	mock.assert_calls_async(2).await;

	assert_eq!(provider.calls(), 1);
	assert_eq!(client.metrics.attempts(), 2);
}

#[tokio::test]
async fn failed_token_acquisition_is_retried_then_returned() {
	let server = MockServer::start_async().await;
	let client =
		build_reqwest_test_client(test_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users");
			then.status(200).body("[]");
		})
		.await;
	let err = client.get("users").await.expect_err("Token outage must surface.");

	assert!(matches!(err, Error::Transient(TransientError::TokenEndpoint { .. })));
	assert!(!client.has_token());

	token_mock.assert_calls_async(2).await;
	api_mock.assert_calls_async(0).await;

	assert_eq!(client.metrics.token_failures(), 2);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let provider = Arc::new(SequenceTokenProvider::default());
	let client = build_sequence_test_client(&server.base_url(), provider.clone());
	let warmup = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/warmup");
			then.status(200).body("[]");
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users").header("authorization", "Bearer token-1");
			then.status(401);
		})
		.await;
	let refreshed = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/users").header("authorization", "Bearer token-2");
			then.status(200).body("[]");
		})
		.await;

	client.get("warmup").await.expect("Warmup request should install the first token.");

	let (first, second) = tokio::join!(client.get("users"), client.get("users"));

	first.expect("First concurrent request should recover.");
	second.expect("Second concurrent request should recover.");

	warmup.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;
	refreshed.assert_calls_async(2).await;

	assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn invalid_path_is_a_configuration_error() {
	let provider = Arc::new(SequenceTokenProvider::default());
	let client = build_sequence_test_client("http://127.0.0.1:9", provider.clone());
	let err = client.get("http://[::1").await.expect_err("Malformed path must be rejected.");

	assert!(matches!(err, Error::Config(_)));
	assert_eq!(provider.calls(), 0);
	assert_eq!(client.metrics.attempts(), 0);
}
