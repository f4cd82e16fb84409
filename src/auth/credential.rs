//! Service account descriptions and their builder.

// std
use std::{borrow::Cow, path::PathBuf};
// self
use crate::{
	_prelude::*,
	auth::{AccountEmail, CredentialKey, ScopeList},
	error::CredentialError,
};

/// Token lifetime requested when a service account does not configure one.
pub const DEFAULT_EXPIRATION: Duration = Duration::hours(1);

/// Where the PEM-encoded RSA private key used to sign assertions comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
	/// Key material supplied inline.
	Pem(String),
	/// Key material read from a file each time an assertion is signed.
	File(PathBuf),
}
impl KeySource {
	/// Returns the PEM bytes, reading the key file when necessary.
	pub fn load(&self) -> Result<Cow<'_, [u8]>, CredentialError> {
		match self {
			Self::Pem(pem) if pem.trim().is_empty() => Err(CredentialError::MissingKey),
			Self::Pem(pem) => Ok(Cow::Borrowed(pem.as_bytes())),
			Self::File(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| {
				CredentialError::KeyFile { path: path.to_owned(), source: Arc::new(e) }
			}),
		}
	}

	fn is_blank(&self) -> bool {
		match self {
			Self::Pem(pem) => pem.trim().is_empty(),
			Self::File(path) => path.as_os_str().is_empty(),
		}
	}
}
impl Debug for KeySource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Pem(_) => f.debug_tuple("Pem").field(&"<redacted>").finish(),
			Self::File(path) => f.debug_tuple("File").field(path).finish(),
		}
	}
}

/// Everything needed to mint a token for one service account.
///
/// Only [`email`](Self::email), [`scopes`](Self::scopes), and [`delegation`](Self::delegation)
/// identify the account for caching purposes, see [`CredentialKey`].
#[derive(Clone, Debug)]
pub struct ServiceAccount {
	/// Service account email, used as the assertion issuer.
	pub email: AccountEmail,
	/// Scopes requested for the token, in order.
	pub scopes: ScopeList,
	/// Private key used to sign assertions.
	pub key: KeySource,
	/// Requested token lifetime; [`DEFAULT_EXPIRATION`] when unset.
	pub expiration: Option<Duration>,
	/// User the service account acts on behalf of, sent as the assertion subject.
	pub delegation: Option<AccountEmail>,
}
impl ServiceAccount {
	/// Returns a builder for the provided service account email.
	pub fn builder(email: impl Into<String>) -> ServiceAccountBuilder {
		ServiceAccountBuilder::new(email.into())
	}

	/// Re-checks the invariants the builder enforces.
	///
	/// Fields are public, so an account may have been modified after it was built.
	pub fn validate(&self) -> Result<(), CredentialError> {
		if self.scopes.is_empty() {
			return Err(CredentialError::MissingScopes);
		}
		if self.key.is_blank() {
			return Err(CredentialError::MissingKey);
		}

		Ok(())
	}

	/// How long a token minted for this account is served from cache.
	///
	/// Zero or negative values are allowed and make every lookup fetch a new token.
	pub fn valid_for(&self) -> Duration {
		self.expiration.unwrap_or(DEFAULT_EXPIRATION)
	}

	/// Cache identity for this account.
	pub fn cache_key(&self) -> CredentialKey {
		CredentialKey::new(self)
	}
}

/// Builder for [`ServiceAccount`].
#[derive(Clone, Debug)]
pub struct ServiceAccountBuilder {
	email: String,
	scopes: Vec<String>,
	key: Option<KeySource>,
	expiration: Option<Duration>,
	delegation: Option<String>,
}
impl ServiceAccountBuilder {
	fn new(email: String) -> Self {
		Self { email, scopes: Vec::new(), key: None, expiration: None, delegation: None }
	}

	/// Appends a single scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Appends several scopes, keeping their order.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Supplies the PEM-encoded private key inline.
	pub fn key_pem(mut self, pem: impl Into<String>) -> Self {
		self.key = Some(KeySource::Pem(pem.into()));

		self
	}

	/// Reads the PEM-encoded private key from a file whenever an assertion is signed.
	pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.key = Some(KeySource::File(path.into()));

		self
	}

	/// Sets the requested token lifetime.
	pub fn expiration(mut self, duration: Duration) -> Self {
		self.expiration = Some(duration);

		self
	}

	/// Sets the requested token lifetime in milliseconds.
	pub fn expiration_millis(self, millis: i64) -> Self {
		self.expiration(Duration::milliseconds(millis))
	}

	/// Requests a token on behalf of another user.
	pub fn delegate_to(mut self, email: impl Into<String>) -> Self {
		self.delegation = Some(email.into());

		self
	}

	/// Consumes the builder and produces a validated [`ServiceAccount`].
	pub fn build(self) -> Result<ServiceAccount, CredentialError> {
		let email = AccountEmail::new(&self.email)?;
		let scopes = ScopeList::new(self.scopes)?;
		let delegation = self
			.delegation
			.map(|value| AccountEmail::with_kind("Delegation", value))
			.transpose()?;
		let key = self.key.ok_or(CredentialError::MissingKey)?;
		let account =
			ServiceAccount { email, scopes, key, expiration: self.expiration, delegation };

		account.validate()?;

		Ok(account)
	}
}
