// std
use std::{sync::Arc, time::Duration};
// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use tower::ServiceExt;
// self
use oauth2_pager::{
	callback::{self, CallbackConfig, CallbackError, CallbackServer},
	ext::{AuthorizationResolver, OneshotResolver},
	url::Url,
};

const PROCESS_ID: u64 = 42;

fn redirecting() -> CallbackConfig {
	CallbackConfig::new(0).with_redirect_url(
		Url::parse("https://app.example/login/done").expect("Redirect fixture should parse."),
	)
}

fn app(config: &CallbackConfig) -> (Router, Arc<OneshotResolver>) {
	let (resolver, _rx) = OneshotResolver::channel();
	let resolver = Arc::new(resolver);
	let dyn_resolver: Arc<dyn AuthorizationResolver> = resolver.clone();

	(callback::router(config, dyn_resolver, PROCESS_ID), resolver)
}

async fn call(router: Router, uri: &str) -> Response {
	router
		.oneshot(
			Request::builder()
				.uri(uri)
				.header(header::ORIGIN, "https://app.example")
				.body(Body::empty())
				.expect("Request fixture should build."),
		)
		.await
		.expect("Router should always answer.")
}

fn location(response: &Response) -> Option<&str> {
	response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok())
}

async fn text(response: Response) -> String {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8.")
}

#[tokio::test]
async fn code_resolves_process_and_redirects_with_success() {
	let (router, resolver) = app(&redirecting());
	let response = call(router, "/callback?code=abc123").await;

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), Some("https://app.example/login/done?status=success"));
	assert_eq!(
		response
			.headers()
			.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
			.and_then(|value| value.to_str().ok()),
		Some("*")
	);
	assert!(resolver.is_resolved());
}

#[tokio::test]
async fn error_redirects_with_error_details() {
	let (router, resolver) = app(&redirecting());
	let response =
		call(router, "/callback?error=access_denied&error_description=User%20declined").await;

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(
		location(&response),
		Some(
			"https://app.example/login/done?status=error&error=access_denied&error_description=User+declined"
		)
	);
	assert!(!resolver.is_resolved());
}

#[tokio::test]
async fn missing_code_redirects_with_synthesized_error() {
	let (router, resolver) = app(&redirecting());
	let response = call(router, "/callback").await;
	let target = Url::parse(location(&response).expect("Redirect must carry a location."))
		.expect("Location should be a URL.");
	let pairs = target.query_pairs().into_owned().collect::<Vec<_>>();

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(pairs[0], ("status".into(), "error".into()));
	assert_eq!(pairs[1], ("error".into(), "no-code".into()));
	assert_eq!(pairs[2].0, "error_description");
	assert!(!resolver.is_resolved());
}

#[tokio::test]
async fn without_redirect_url_statuses_carry_the_outcome() {
	let config = CallbackConfig::default();
	let (router, resolver) = app(&config);
	let denied = call(router.clone(), "/callback?error=access_denied&error_description=nope").await;

	assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(text(denied).await, "Unable to log in: nope");

	let missing = call(router.clone(), "/callback?state=xyz").await;

	assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
	assert!(!resolver.is_resolved());

	let accepted = call(router, "/callback?code=abc123").await;

	assert_eq!(accepted.status(), StatusCode::OK);
	assert_eq!(text(accepted).await, "Successfully logged in");
	assert!(resolver.is_resolved());
}

#[tokio::test]
async fn server_delivers_first_code_and_stops() {
	let (resolver, resolver_rx) = OneshotResolver::channel();
	let handle = CallbackServer::new(CallbackConfig::new(0))
		.start(Arc::new(resolver), PROCESS_ID)
		.await
		.expect("Callback server should bind an ephemeral port.");
	let url = format!("{}?code=from-browser", handle.callback_url());
	let response = oauth2_pager::reqwest::get(&url).await.expect("Callback request should succeed.");

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(
		handle.wait(Duration::from_secs(5)).await.expect("Code should be delivered."),
		(PROCESS_ID, "from-browser".to_owned())
	);
	assert_eq!(
		resolver_rx.await.expect("External resolver should be resolved."),
		(PROCESS_ID, "from-browser".to_owned())
	);
}

#[tokio::test]
async fn wait_times_out_without_a_callback() {
	let (resolver, _rx) = OneshotResolver::channel();
	let handle = CallbackServer::new(CallbackConfig::new(0))
		.start(Arc::new(resolver), PROCESS_ID)
		.await
		.expect("Callback server should bind an ephemeral port.");
	let err = handle
		.wait(Duration::from_millis(50))
		.await
		.expect_err("No callback arrives in this test.");

	assert!(matches!(err, CallbackError::TimedOut(_)));
}
