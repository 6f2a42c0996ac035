// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, provider::ApiDescriptor};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ApiDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// API base URL is mandatory.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Endpoints must use HTTPS unless they target a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The API base cannot carry a query or fragment because request paths are appended to it.
	#[error("The API base URL must not carry a query or fragment: {url}.")]
	ApiBaseWithQuery {
		/// Offending URL.
		url: String,
	},
}

/// Builder for [`ApiDescriptor`] values.
#[derive(Debug, Default, Deserialize)]
pub struct ApiDescriptorBuilder {
	/// OAuth token endpoint.
	pub token_endpoint: Option<Url>,
	/// Base URL for collection requests.
	pub api_base: Option<Url>,
}
impl ApiDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the API base URL. A missing trailing `/` is added during [`build`](Self::build).
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, ApiDescriptorError> {
		let token_endpoint = self.token_endpoint.ok_or(ApiDescriptorError::MissingTokenEndpoint)?;
		let mut api_base = self.api_base.ok_or(ApiDescriptorError::MissingApiBase)?;

		validate_endpoint("token", &token_endpoint)?;
		validate_endpoint("API base", &api_base)?;

		if api_base.query().is_some() || api_base.fragment().is_some() {
			return Err(ApiDescriptorError::ApiBaseWithQuery { url: api_base.to_string() });
		}
		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		Ok(ApiDescriptor { token_endpoint, api_base })
	}
}
impl TryFrom<ApiDescriptorBuilder> for ApiDescriptor {
	type Error = ApiDescriptorError;

	fn try_from(builder: ApiDescriptorBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ApiDescriptorError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ApiDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}
