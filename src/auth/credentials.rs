//! Validated client credentials for the client-credentials grant.

// self
use crate::{_prelude::*, auth::Secret};

const CLIENT_ID_MAX_LEN: usize = 256;

/// Error returned when credential validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CredentialsError {
	/// The field was empty.
	#[error("{field} cannot be empty.")]
	Empty {
		/// Which credential field failed validation.
		field: &'static str,
	},
	/// The field contains whitespace characters.
	#[error("{field} contains whitespace.")]
	ContainsWhitespace {
		/// Which credential field failed validation.
		field: &'static str,
	},
	/// The client identifier exceeded the allowed character count.
	#[error("Client identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Immutable client identifier + secret pair used to mint bearer tokens.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
	client_id: String,
	client_secret: Secret,
}
impl Credentials {
	/// Creates credentials after validating both halves.
	pub fn new(
		client_id: impl AsRef<str>,
		client_secret: impl Into<String>,
	) -> Result<Self, CredentialsError> {
		let client_id = client_id.as_ref();
		let client_secret = client_secret.into();

		validate_view("Client identifier", client_id)?;

		if client_id.len() > CLIENT_ID_MAX_LEN {
			return Err(CredentialsError::TooLong { max: CLIENT_ID_MAX_LEN });
		}

		validate_view("Client secret", &client_secret)?;

		Ok(Self { client_id: client_id.to_owned(), client_secret: Secret::new(client_secret) })
	}

	/// OAuth 2.0 client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// OAuth 2.0 client secret.
	pub fn client_secret(&self) -> &Secret {
		&self.client_secret
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}
impl TryFrom<RawCredentials> for Credentials {
	type Error = CredentialsError;

	fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
		Self::new(raw.client_id, raw.client_secret)
	}
}

#[derive(Deserialize)]
struct RawCredentials {
	client_id: String,
	client_secret: String,
}

fn validate_view(field: &'static str, view: &str) -> Result<(), CredentialsError> {
	if view.is_empty() {
		return Err(CredentialsError::Empty { field });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(CredentialsError::ContainsWhitespace { field });
	}

	Ok(())
}
