//! Token endpoint exchange for the jwt-bearer grant (RFC 7523 §2.1).

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, ExchangeError},
	http::TokenHttpClient,
	jwt::SignedAssertion,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Grant type posted alongside the assertion.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google's OAuth 2.0 token endpoint, used when no endpoint is configured.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
	#[serde(default)]
	error: Option<String>,
}

/// Posts signed assertions to a token endpoint and extracts the bearer token.
pub struct JwtBearerExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client used for every exchange.
	pub http_client: Arc<C>,
	/// Token endpoint URL; also the audience of every assertion.
	pub token_endpoint: Url,
}
impl<C> JwtBearerExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates an exchanger posting to `token_endpoint` through `http_client`.
	pub fn new(http_client: impl Into<Arc<C>>, token_endpoint: Url) -> Self {
		Self { http_client: http_client.into(), token_endpoint }
	}

	/// Exchanges `assertion` for a bearer token.
	///
	/// # Errors
	///
	/// - [`ExchangeError::Transport`] when no response was received.
	/// - [`ExchangeError::Status`] for any status other than 200, with the raw body.
	/// - [`ExchangeError::Parse`] when a 200 body carries no `access_token`.
	pub async fn exchange(&self, assertion: &SignedAssertion) -> Result<AccessToken> {
		obs::observe_flow(FlowKind::Exchange, "exchange", self.post_assertion(assertion)).await
	}

	async fn post_assertion(&self, assertion: &SignedAssertion) -> Result<AccessToken> {
		let body = form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", JWT_BEARER_GRANT)
			.append_pair("assertion", assertion.expose())
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.token_endpoint.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let handle = self.http_client.handle();
		let response = handle.call(request).await.map_err(map_transport_error)?;
		let status = response.status().as_u16();

		parse_token_response(status, response.body())
	}
}
#[cfg(feature = "reqwest")]
impl Default for JwtBearerExchanger<ReqwestHttpClient> {
	fn default() -> Self {
		let endpoint =
			Url::parse(DEFAULT_TOKEN_ENDPOINT).expect("Default token endpoint must be a valid URL.");

		// `without_redirects` only fails where reqwest's own default client would panic.
		Self::new(ReqwestHttpClient::without_redirects().unwrap_or_default(), endpoint)
	}
}
impl<C> Clone for JwtBearerExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone(), token_endpoint: self.token_endpoint.clone() }
	}
}
impl<C> Debug for JwtBearerExchanger<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtBearerExchanger")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.finish()
	}
}

fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		other => ExchangeError::transport(other).into(),
	}
}

fn parse_token_response(status: u16, bytes: &[u8]) -> Result<AccessToken> {
	let body = String::from_utf8_lossy(bytes).into_owned();

	if status != 200 {
		let oauth_error =
			serde_json::from_slice::<ErrorResponse>(bytes).unwrap_or_default().error;

		return Err(ExchangeError::Status { status, oauth_error, body }.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(bytes);
	let parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ExchangeError::Parse { status, body, source: Arc::new(source) })?;

	Ok(AccessToken::new(parsed.access_token))
}
