//! The authenticator boundary the token cache depends on, and its HTTP jwt-bearer implementation.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ServiceAccount},
	exchange::JwtBearerExchanger,
	http::TokenHttpClient,
	jwt::{self, AssertionSigner, Rs256Signer, SignedAssertion},
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

/// Boxed future returned by [`Authenticator::authenticate`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Mints a fresh bearer token for a service account.
///
/// The token cache calls this at most once per credential at a time; implementations do not need
/// their own deduplication. Tests substitute stubs to observe or script invocations.
pub trait Authenticator
where
	Self: Send + Sync,
{
	/// Obtains a new bearer token for `account`.
	fn authenticate<'a>(&'a self, account: &'a ServiceAccount) -> AuthFuture<'a>;
}

/// Authenticator that signs a jwt-bearer assertion locally and exchanges it over HTTP.
pub struct JwtBearerAuthenticator<C, S = Rs256Signer>
where
	C: ?Sized + TokenHttpClient,
	S: AssertionSigner,
{
	/// Exchanger holding the HTTP client and token endpoint.
	pub exchanger: JwtBearerExchanger<C>,
	/// Signer producing the assertion.
	pub signer: S,
}
impl<C> JwtBearerAuthenticator<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an authenticator that posts to `token_endpoint` through `http_client`.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, token_endpoint: Url) -> Self {
		Self { exchanger: JwtBearerExchanger::new(http_client, token_endpoint), signer: Rs256Signer }
	}
}
impl<C, S> JwtBearerAuthenticator<C, S>
where
	C: ?Sized + TokenHttpClient,
	S: AssertionSigner,
{
	/// Replaces the assertion signer.
	pub fn with_signer<T>(self, signer: T) -> JwtBearerAuthenticator<C, T>
	where
		T: AssertionSigner,
	{
		JwtBearerAuthenticator { exchanger: self.exchanger, signer }
	}

	/// Token endpoint the assertions are addressed to.
	pub fn token_endpoint(&self) -> &Url {
		&self.exchanger.token_endpoint
	}

	/// Validates `account` and signs its assertion without contacting the token endpoint.
	pub fn assertion(&self, account: &ServiceAccount) -> Result<SignedAssertion> {
		jwt::sign_account(&self.signer, account, self.token_endpoint())
	}

	async fn run(&self, account: &ServiceAccount) -> Result<AccessToken> {
		let assertion = self.assertion(account)?;

		self.exchanger.exchange(&assertion).await
	}
}
#[cfg(feature = "reqwest")]
impl JwtBearerAuthenticator<ReqwestHttpClient> {
	/// Creates an authenticator backed by reqwest that posts to Google's token endpoint.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a reqwest-backed authenticator that posts to `token_endpoint`.
	pub fn with_token_endpoint(token_endpoint: &str) -> Result<Self> {
		let endpoint = Url::parse(token_endpoint)
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;

		Ok(Self::with_http_client(ReqwestHttpClient::without_redirects()?, endpoint))
	}
}
#[cfg(feature = "reqwest")]
impl Default for JwtBearerAuthenticator<ReqwestHttpClient> {
	fn default() -> Self {
		Self { exchanger: JwtBearerExchanger::default(), signer: Rs256Signer }
	}
}
impl<C, S> Authenticator for JwtBearerAuthenticator<C, S>
where
	C: ?Sized + TokenHttpClient,
	S: AssertionSigner,
{
	fn authenticate<'a>(&'a self, account: &'a ServiceAccount) -> AuthFuture<'a> {
		Box::pin(obs::observe_flow(FlowKind::Authenticate, "authenticate", self.run(account)))
	}
}
impl<C, S> Debug for JwtBearerAuthenticator<C, S>
where
	C: ?Sized + TokenHttpClient,
	S: AssertionSigner,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtBearerAuthenticator").field("exchanger", &self.exchanger).finish()
	}
}
