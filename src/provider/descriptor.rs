//! API descriptor data structures and request path resolution.

/// Builder API for assembling API descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Immutable descriptor naming the endpoints a client talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ApiDescriptorBuilder")]
pub struct ApiDescriptor {
	/// OAuth token endpoint used for the client-credentials grant.
	pub token_endpoint: Url,
	/// Base URL every request path is resolved against; always ends with `/`.
	pub api_base: Url,
}
impl ApiDescriptor {
	/// Creates a new, empty builder.
	pub fn builder() -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::default()
	}

	/// Resolves a request path (optionally carrying its own query string) against the API base.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let url = self
			.api_base
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })?;

		// Bearer tokens must never travel to another origin.
		if !url.as_str().starts_with(self.api_base.as_str()) {
			return Err(ConfigError::PathOutsideApiBase { path: path.to_owned() });
		}

		Ok(url)
	}
}
