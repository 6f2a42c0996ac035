//! Walks a mocked collection endpoint page by page through the process-wide rate limiter, printing
//! progress as pages arrive.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
use url::Url;
// self
use oauth2_pager::{
	auth::Credentials,
	client::{Client, FetchOptions},
	http::ReqwestHttpClient,
	oauth::{ClientCredentialsProvider, TokenProvider},
	provider::ApiDescriptor,
	rate_limit::RateLimiter,
};

#[derive(Debug, Deserialize)]
struct Campus {
	id: u64,
	name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":7200}",
			);
		})
		.await;

	for number in 1..=3_u64 {
		let first = (number - 1) * 100;
		let count = if number == 3 { 17 } else { 100 };

		server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/v2/campus")
					.header("authorization", "Bearer demo-access")
					.query_param("page[number]", number.to_string());
				then.status(200).header("x-total", "217").json_body(json!(
					(first..first + count)
						.map(|id| json!({ "id": id, "name": format!("campus-{id}") }))
						.collect::<Vec<_>>()
				));
			})
			.await;
	}

	let descriptor = ApiDescriptor::builder()
		.token_endpoint(Url::parse(&server.url("/oauth/token"))?)
		.api_base(Url::parse(&server.url("/v2/"))?)
		.build()?;
	let http_client = ReqwestHttpClient::default();
	let provider: Arc<dyn TokenProvider> = Arc::new(<ClientCredentialsProvider>::with_http_client(
		&descriptor,
		Credentials::new("demo-client", "demo-secret")?,
		http_client.clone(),
	));
	let client =
		Client::with_token_provider(descriptor, provider, http_client, RateLimiter::shared());
	let options = FetchOptions::new().progress(|current: usize, total: Option<usize>| match total {
		Some(total) => println!("Fetched {current}/{total} campuses."),
		None => println!("Fetched {current} campuses."),
	});
	let campuses = client.fetch_with::<Campus>("campus", options).await.into_result()?;

	println!(
		"Last campus: {:?}.",
		campuses.last().map(|campus| (campus.id, campus.name.as_str()))
	);

	token_mock.assert_async().await;

	Ok(())
}
