//! RS256 assertion signing.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::ServiceAccount,
	error::SigningError,
	jwt::Claims,
};

/// Compact `header.claims.signature` assertion; formatting never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);
impl SignedAssertion {
	/// Returns the compact serialization. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for SignedAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SignedAssertion").field(&"<redacted>").finish()
	}
}

/// Signs claim sets into compact assertions.
pub trait AssertionSigner
where
	Self: Send + Sync,
{
	/// Signs `claims` with the PEM-encoded private key.
	fn sign(&self, claims: &Claims, key_pem: &[u8]) -> Result<SignedAssertion, SigningError>;
}

/// Signs assertions with RSASSA-PKCS1-v1_5 using SHA-256, the only algorithm token endpoints
/// accept for service account assertions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rs256Signer;
impl AssertionSigner for Rs256Signer {
	fn sign(&self, claims: &Claims, key_pem: &[u8]) -> Result<SignedAssertion, SigningError> {
		let key = EncodingKey::from_rsa_pem(key_pem).map_err(SigningError::invalid_key)?;
		let compact = jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key)
			.map_err(SigningError::sign)?;

		match compact.rsplit_once('.') {
			Some((_, signature)) if !signature.is_empty() => Ok(SignedAssertion(compact)),
			_ => Err(SigningError::EmptySignature),
		}
	}
}

/// Validates `account`, builds its claims for `audience` as of now, and signs them.
///
/// Runs entirely before any network call: invalid input surfaces as [`Error::Credential`] and
/// key problems as [`Error::Signing`].
pub fn sign_account<S>(
	signer: &S,
	account: &ServiceAccount,
	audience: &Url,
) -> Result<SignedAssertion>
where
	S: ?Sized + AssertionSigner,
{
	account.validate()?;

	let key = account.key.load()?;
	let claims = Claims::for_account(account, audience, OffsetDateTime::now_utc())?;

	Ok(signer.sign(&claims, &key)?)
}

/// [`sign_account`] with the default [`Rs256Signer`].
pub fn encode_assertion(account: &ServiceAccount, audience: &Url) -> Result<SignedAssertion> {
	sign_account(&Rs256Signer, account, audience)
}
