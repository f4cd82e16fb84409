//! Claim set carried by a service account assertion.

// self
use crate::{_prelude::*, auth::ServiceAccount, error::CredentialError};

/// Claims of a jwt-bearer assertion (RFC 7523 §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Service account email.
	pub iss: String,
	/// Requested scopes joined by a single space.
	pub scope: String,
	/// Token endpoint URL the assertion is meant for.
	pub aud: String,
	/// Expiry, in whole seconds since the Unix epoch.
	pub exp: i64,
	/// Issued-at, in whole seconds since the Unix epoch.
	pub iat: i64,
	/// Delegated user, when acting on someone's behalf.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
}
impl Claims {
	/// Builds the claim set for `account`, issued at `now` for the given audience.
	///
	/// Both timestamps are truncated to whole seconds; the lifetime is the account's configured
	/// expiration, or one hour.
	///
	/// # Errors
	///
	/// [`CredentialError::ExpirationOutOfRange`] when `iat + lifetime` overflows.
	pub fn for_account(
		account: &ServiceAccount,
		audience: &Url,
		now: OffsetDateTime,
	) -> Result<Self, CredentialError> {
		let iat = now.unix_timestamp();
		let seconds = account.valid_for().whole_seconds();
		let exp =
			iat.checked_add(seconds).ok_or(CredentialError::ExpirationOutOfRange { seconds })?;

		Ok(Self {
			iss: account.email.to_string(),
			scope: account.scopes.joined(),
			aud: audience.as_str().to_owned(),
			exp,
			iat,
			sub: account.delegation.as_ref().map(ToString::to_string),
		})
	}

	/// Requested lifetime in seconds.
	pub fn lifetime(&self) -> i64 {
		self.exp - self.iat
	}
}
