//! In-memory token cache keyed by credential identity.
//!
//! [`TokenCache`] lazily creates one [`TokenRequest`] per [`CredentialKey`] and delegates every
//! lookup to it, so concurrent callers sharing a credential trigger a single exchange while
//! callers with different credentials never wait on each other. Entries live until
//! [`TokenCache::clear`]; nothing is evicted by age, which suits the small, application-defined
//! set of service accounts a process talks to.
//!
//! There is no process-wide instance: whoever wires the application creates a cache at start-up
//! and hands it (typically behind an [`Arc`]) to the code that needs tokens.

pub mod request;

pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey, ServiceAccount},
	authenticator::Authenticator,
};
#[cfg(feature = "reqwest")] use crate::authenticator::JwtBearerAuthenticator;

/// Deduplicating, expiry-aware token cache.
pub struct TokenCache {
	authenticator: Arc<dyn Authenticator>,
	entries: Mutex<HashMap<CredentialKey, TokenRequest>>,
}
impl TokenCache {
	/// Creates an empty cache that mints tokens with `authenticator`.
	pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
		Self { authenticator, entries: Default::default() }
	}

	/// Creates an empty cache that takes ownership of `authenticator`.
	pub fn with_authenticator(authenticator: impl 'static + Authenticator) -> Self {
		Self::new(Arc::new(authenticator))
	}

	/// Authenticator used for every exchange.
	pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
		&self.authenticator
	}

	/// Returns a valid token for `account`, reusing a cached one when possible.
	///
	/// The first lookup for a credential identity binds the entry to that `account`
	/// description; later descriptions with the same identity but other key material or
	/// expiration reuse it unchanged. Every failure is delivered through the returned future.
	pub async fn get(&self, account: &ServiceAccount) -> Result<AccessToken> {
		self.entry(account).get().await
	}

	/// Returns the entry for `account`'s identity, creating it if absent.
	pub fn entry(&self, account: &ServiceAccount) -> TokenRequest {
		let mut entries = self.entries.lock();

		entries
			.entry(account.cache_key())
			.or_insert_with(|| TokenRequest::new(account.clone(), self.authenticator.clone()))
			.clone()
	}

	/// Status of the entry for `account`'s identity, if one exists.
	pub fn status(&self, account: &ServiceAccount) -> Option<RequestStatus> {
		let request = self.entries.lock().get(&account.cache_key()).cloned();

		request.map(|request| request.status())
	}

	/// Discards every entry.
	///
	/// In-flight exchanges are not cancelled: callers already waiting on them still receive
	/// their result, but it is no longer reachable from the cache and the next lookup starts a
	/// fresh entry.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	/// Number of credential identities currently tracked.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns true if no identity is tracked.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
#[cfg(feature = "reqwest")]
impl Default for TokenCache {
	/// Cache backed by [`JwtBearerAuthenticator::default`].
	fn default() -> Self {
		Self::with_authenticator(JwtBearerAuthenticator::default())
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache").field("entries", &self.len()).finish()
	}
}
