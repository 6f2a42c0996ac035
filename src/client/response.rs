//! Buffered API response with header and JSON helpers.

// crates.io
use reqwest::header::HeaderMap;
// self
use crate::{_prelude::*, error::TransientError};

/// Response header carrying the total number of items in a collection.
pub const TOTAL_HEADER: &str = "x-total";

/// Successful API response, fully buffered.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: u16,
	url: Url,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Wraps already-received response parts.
	pub fn new(status: u16, url: Url, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, url, headers, body }
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Final request URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns a header value when it is present and valid visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name)?.to_str().ok()
	}

	/// Total collection size announced by the `x-total` header.
	pub fn total(&self) -> Option<usize> {
		self.header(TOTAL_HEADER)?.trim().parse().ok()
	}

	/// Decodes the body as JSON, reporting the path of the first mismatch on failure.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| {
			TransientError::ResponseParse { url: self.url.to_string(), source }.into()
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn response(total: Option<&'static str>, body: &str) -> ApiResponse {
		let mut headers = HeaderMap::new();

		if let Some(total) = total {
			headers.insert(TOTAL_HEADER, HeaderValue::from_static(total));
		}

		ApiResponse::new(
			200,
			Url::parse("https://api.example/v2/users").expect("URL fixture should parse."),
			headers,
			body.as_bytes().to_vec(),
		)
	}

	#[test]
	fn total_reads_x_total_header() {
		assert_eq!(response(Some("250"), "[]").total(), Some(250));
		assert_eq!(response(Some(" 7 "), "[]").total(), Some(7));
		assert_eq!(response(Some("many"), "[]").total(), None);
		assert_eq!(response(None, "[]").total(), None);
	}

	#[test]
	fn json_reports_mismatch_path() {
		#[derive(Debug, Deserialize)]
		struct User {
			#[allow(dead_code)]
			id: u64,
		}

		let users: Vec<User> =
			response(None, r#"[{"id":1},{"id":2}]"#).json().expect("Users should decode.");

		assert_eq!(users.len(), 2);

		let err = response(None, r#"[{"id":1},{"id":"two"}]"#)
			.json::<Vec<User>>()
			.expect_err("Mismatched id must fail to decode.");

		match err {
			Error::Transient(TransientError::ResponseParse { source, .. }) =>
				assert_eq!(source.path().to_string(), "[1].id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
