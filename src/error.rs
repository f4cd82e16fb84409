//! Crate-level error types shared by the cache, the authenticator, and its collaborators.
//!
//! Every variant is [`Clone`] because a single exchange result is handed to every caller that
//! waited on it; foreign error sources are therefore held behind [`Arc`].

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ScopeValidationError},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Service account description is incomplete or malformed.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Assertion could not be signed with the supplied key.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Token endpoint exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns `true` when an immediate retry could plausibly succeed.
	///
	/// Invalid input and key problems will fail the same way every time; transport failures and
	/// server-side (5xx) or throttling (429) responses may not.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Exchange(ExchangeError::Transport { .. }) => true,
			Self::Exchange(ExchangeError::Status { status, .. }) =>
				*status == 429 || (500..600).contains(status),
			_ => false,
		}
	}
}

/// Invalid or missing service account fields, raised before any network call.
#[derive(Clone, Debug, ThisError)]
pub enum CredentialError {
	/// Principal or delegation email failed validation.
	#[error(transparent)]
	InvalidEmail(#[from] IdentifierError),
	/// No scope was requested.
	#[error("At least one scope is required.")]
	MissingScopes,
	/// A scope entry is empty or contains whitespace.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Neither inline key material nor a key file was supplied.
	#[error("A private key is required; supply it inline or as a key file.")]
	MissingKey,
	/// The requested lifetime pushes the assertion expiry past the representable range.
	#[error("Expiration of {seconds} seconds is out of range.")]
	ExpirationOutOfRange {
		/// Requested lifetime, in whole seconds.
		seconds: i64,
	},
	/// The configured key file could not be read.
	#[error("Key file `{}` could not be read.", .path.display())]
	KeyFile {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: Arc<std::io::Error>,
	},
}

/// Failures raised while signing an assertion.
#[derive(Clone, Debug, ThisError)]
pub enum SigningError {
	/// Key material is not a usable RSA private key.
	#[error("Private key is not a valid RSA PEM key.")]
	InvalidKey {
		/// Underlying key parsing failure.
		#[source]
		source: Arc<jsonwebtoken::errors::Error>,
	},
	/// Signature production failed.
	#[error("Failed to sign the assertion; the key is probably invalid.")]
	Sign {
		/// Underlying signing failure.
		#[source]
		source: Arc<jsonwebtoken::errors::Error>,
	},
	/// Signing returned an empty signature segment.
	#[error("Failed to sign the assertion; the signature is empty.")]
	EmptySignature,
}
impl SigningError {
	pub(crate) fn invalid_key(src: jsonwebtoken::errors::Error) -> Self {
		Self::InvalidKey { source: Arc::new(src) }
	}

	pub(crate) fn sign(src: jsonwebtoken::errors::Error) -> Self {
		Self::Sign { source: Arc::new(src) }
	}
}

/// Failures raised while exchanging a signed assertion at the token endpoint.
#[derive(Clone, Debug, ThisError)]
pub enum ExchangeError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Token endpoint answered with a non-200 status.
	#[error(
		"Failed to obtain an access token, the token endpoint returned HTTP {status}{}.",
		oauth_error_suffix(.oauth_error)
	)]
	Status {
		/// HTTP status code.
		status: u16,
		/// OAuth `error` field, when the body carried one.
		oauth_error: Option<String>,
		/// Raw response body, kept for diagnostics.
		body: String,
	},
	/// Token endpoint answered 200 with a body that is not a token response.
	#[error("Failed to parse the token endpoint response body: {body}.")]
	Parse {
		/// HTTP status code.
		status: u16,
		/// Raw response body, kept for diagnostics.
		body: String,
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
}
impl ExchangeError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Arc::new(src) }
	}

	/// HTTP status code of the failed response, if a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport { .. } => None,
			Self::Status { status, .. } | Self::Parse { status, .. } => Some(*status),
		}
	}

	/// Raw response body of the failed response, if a response was received.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Transport { .. } => None,
			Self::Status { body, .. } | Self::Parse { body, .. } => Some(body),
		}
	}
}

fn oauth_error_suffix(oauth_error: &Option<String>) -> String {
	oauth_error.as_deref().map(|code| format!(": {code}")).unwrap_or_default()
}

/// Configuration and validation failures of the surrounding plumbing.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("Token request could not be constructed.")]
	HttpRequest {
		/// Underlying request builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_error_carries_status_and_body() {
		let err = ExchangeError::Status {
			status: 400,
			oauth_error: Some("invalid_grant".into()),
			body: "{\"error\":\"invalid_grant\"}".into(),
		};

		assert_eq!(err.status(), Some(400));
		assert_eq!(err.body(), Some("{\"error\":\"invalid_grant\"}"));
		assert_eq!(
			err.to_string(),
			"Failed to obtain an access token, the token endpoint returned HTTP 400: invalid_grant."
		);
		assert!(!Error::from(err).is_retryable());
	}

	#[test]
	fn server_errors_are_retryable() {
		let err = Error::from(ExchangeError::Status {
			status: 503,
			oauth_error: None,
			body: String::new(),
		});

		assert!(err.is_retryable());
		assert!(!Error::from(CredentialError::MissingScopes).is_retryable());
	}

	#[test]
	fn key_file_error_exposes_io_source() {
		let err = Error::from(CredentialError::KeyFile {
			path: PathBuf::from("/missing.pem"),
			source: Arc::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
		});
		let cloned = err.clone();

		assert!(cloned.to_string().contains("/missing.pem"));
		assert!(StdError::source(&cloned).is_some());
	}
}
