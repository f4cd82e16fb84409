//! Per-credential token state machine.
//!
//! A [`TokenRequest`] cycles through `Expired → Pending → Completed → Expired`. While Pending it
//! holds one shared, single-assignment fetch future: the first caller creates it, every caller
//! arriving before it resolves awaits a clone of it, and its result fans out to all of them.

// crates.io
use futures::{
	FutureExt,
	future::{BoxFuture, Shared},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CredentialKey, ServiceAccount},
	authenticator::Authenticator,
	obs::{self, CacheLookup},
};

type SharedFetch = Shared<BoxFuture<'static, Result<AccessToken>>>;

/// Observable lifecycle status of a [`TokenRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestStatus {
	/// No usable token; the next lookup starts an exchange.
	Expired,
	/// An exchange is in flight; lookups join it.
	Pending,
	/// A token is cached and still within its validity window.
	Completed,
}

/// Owns the token lifecycle of one credential identity.
///
/// Cloning is cheap and every clone drives the same state.
#[derive(Clone)]
pub struct TokenRequest(Arc<RequestInner>);
impl TokenRequest {
	/// Creates an expired request bound to `account`.
	///
	/// Every exchange this request performs uses `account` as given here, including its key
	/// material and expiration.
	pub fn new(account: ServiceAccount, authenticator: Arc<dyn Authenticator>) -> Self {
		Self(Arc::new(RequestInner {
			key: account.cache_key(),
			account: Arc::new(account),
			authenticator,
			state: Mutex::new(RequestState::Expired),
		}))
	}

	/// Identity this request serves.
	pub fn key(&self) -> &CredentialKey {
		&self.0.key
	}

	/// Logical status right now; a cached token past its window reports [`RequestStatus::Expired`].
	pub fn status(&self) -> RequestStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns a valid token, fetching one if needed.
	///
	/// At most one exchange runs at a time for this request. A failed exchange resolves every
	/// waiting caller with the same error and leaves the request expired, so the next call
	/// retries from scratch.
	pub async fn get(&self) -> Result<AccessToken> {
		match self.lookup(OffsetDateTime::now_utc()) {
			Ticket::Ready(token) => Ok(token),
			Ticket::Wait(fetch) => fetch.await,
		}
	}

	pub(crate) fn status_at(&self, now: OffsetDateTime) -> RequestStatus {
		match &*self.0.state.lock() {
			RequestState::Completed(cached) if cached.is_fresh_at(now) => RequestStatus::Completed,
			RequestState::Pending(_) => RequestStatus::Pending,
			_ => RequestStatus::Expired,
		}
	}

	/// Serves a fresh token or hands out the fetch to await, starting one when needed.
	///
	/// Checking the state and installing a new fetch happen under one lock, so concurrent
	/// callers can never start two exchanges.
	fn lookup(&self, now: OffsetDateTime) -> Ticket {
		let mut state = self.0.state.lock();
		let served = match &*state {
			RequestState::Completed(cached) if cached.is_fresh_at(now) =>
				Some((Ticket::Ready(cached.token.clone()), CacheLookup::Hit)),
			RequestState::Pending(fetch) => Some((Ticket::Wait(fetch.clone()), CacheLookup::Joined)),
			_ => None,
		};
		let (ticket, lookup) = match served {
			Some(served) => served,
			None => {
				let lookup = if matches!(*state, RequestState::Completed(_)) {
					CacheLookup::Refresh
				} else {
					CacheLookup::Fetch
				};
				let fetch = self.start_fetch();

				*state = RequestState::Pending(fetch.clone());

				(Ticket::Wait(fetch), lookup)
			},
		};

		drop(state);
		obs::record_cache_lookup(lookup);
		obs::trace_lookup(&self.0.key, lookup);

		ticket
	}

	fn start_fetch(&self) -> SharedFetch {
		let inner = Arc::downgrade(&self.0);
		let account = self.0.account.clone();
		let authenticator = self.0.authenticator.clone();

		async move {
			let result = authenticator.authenticate(&account).await;

			// A cleared cache may have dropped the entry; waiters still get the result.
			if let Some(inner) = inner.upgrade() {
				inner.settle(&result);
			}

			result
		}
		.boxed()
		.shared()
	}
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("key", &self.0.key)
			.field("status", &self.status())
			.finish()
	}
}

struct RequestInner {
	key: CredentialKey,
	account: Arc<ServiceAccount>,
	authenticator: Arc<dyn Authenticator>,
	state: Mutex<RequestState>,
}
impl RequestInner {
	fn settle(&self, result: &Result<AccessToken>) {
		let mut state = self.state.lock();

		*state = match result {
			Ok(token) => RequestState::Completed(CachedToken {
				token: token.clone(),
				issued_at: OffsetDateTime::now_utc(),
				valid_for: self.account.valid_for(),
			}),
			Err(_) => RequestState::Expired,
		};

		drop(state);
		obs::trace_settled(&self.key, result.is_ok());
	}
}

enum RequestState {
	Expired,
	Pending(SharedFetch),
	Completed(CachedToken),
}

struct CachedToken {
	token: AccessToken,
	issued_at: OffsetDateTime,
	valid_for: Duration,
}
impl CachedToken {
	/// Valid while `now < issued_at + valid_for`.
	fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		match self.issued_at.checked_add(self.valid_for) {
			Some(expires_at) => now < expires_at,
			None => self.valid_for.is_positive(),
		}
	}
}

enum Ticket {
	Ready(AccessToken),
	Wait(SharedFetch),
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// self
	use super::*;
	use crate::{_preludet::*, error::ExchangeError};

	fn request(stub: &Arc<StubAuthenticator>, expiration_ms: Option<i64>) -> TokenRequest {
		let mut account = test_account("svc@x", &["a", "b"]);

		account.expiration = expiration_ms.map(Duration::milliseconds);

		TokenRequest::new(account, stub.clone())
	}

	fn status_error() -> Error {
		ExchangeError::Status { status: 500, oauth_error: None, body: "boom".into() }.into()
	}

	#[tokio::test]
	async fn starts_expired_and_completes_after_fetch() {
		let stub = Arc::new(StubAuthenticator::default());
		let request = request(&stub, None);

		assert_eq!(request.status(), RequestStatus::Expired);

		let token = request.get().await.expect("Stub fetch should succeed.");

		assert_eq!(token.expose(), "token-1");
		assert_eq!(request.status(), RequestStatus::Completed);
		assert_eq!(stub.calls(), 1);
	}

	#[tokio::test]
	async fn pending_callers_join_the_in_flight_fetch() {
		let stub = Arc::new(StubAuthenticator::with_delay(StdDuration::from_millis(50)));
		let request = request(&stub, None);
		let first = request.get();
		let second = request.get();
		let third = request.get();
		let (first, second, third) = tokio::join!(first, second, third);

		assert_eq!(stub.calls(), 1);

		for token in [first, second, third] {
			assert_eq!(token.expect("Joined fetch should succeed.").expose(), "token-1");
		}
	}

	#[tokio::test]
	async fn status_is_pending_while_fetch_runs() {
		let stub = Arc::new(StubAuthenticator::with_delay(StdDuration::from_millis(100)));
		let request = request(&stub, None);
		let background = request.clone();
		let task = tokio::spawn(async move { background.get().await });

		tokio::time::sleep(StdDuration::from_millis(20)).await;

		assert_eq!(request.status(), RequestStatus::Pending);

		task.await.expect("Fetch task should not panic.").expect("Fetch should succeed.");

		assert_eq!(request.status(), RequestStatus::Completed);
	}

	#[tokio::test]
	async fn lookups_past_the_window_refresh() {
		let stub = Arc::new(StubAuthenticator::default());
		let request = request(&stub, Some(60_000));

		request.get().await.expect("First fetch should succeed.");

		let later = OffsetDateTime::now_utc() + Duration::minutes(2);

		assert_eq!(request.status_at(later), RequestStatus::Expired);

		let Ticket::Wait(fetch) = request.lookup(later) else {
			panic!("Expired token must not be served.");
		};
		let token = fetch.await.expect("Refresh should succeed.");

		assert_eq!(token.expose(), "token-2");
		assert_eq!(stub.calls(), 2);
	}

	#[tokio::test]
	async fn zero_expiration_always_fetches() {
		let stub = Arc::new(StubAuthenticator::default());
		let request = request(&stub, Some(0));

		request.get().await.expect("First fetch should succeed.");
		request.get().await.expect("Second fetch should succeed.");

		assert_eq!(stub.calls(), 2);
		assert_eq!(request.status(), RequestStatus::Expired);
	}

	#[tokio::test]
	async fn failure_fans_out_and_leaves_entry_expired() {
		let stub = Arc::new(
			StubAuthenticator::with_delay(StdDuration::from_millis(30))
				.with_script([Err(status_error())]),
		);
		let request = request(&stub, None);
		let (first, second) = tokio::join!(request.get(), request.get());

		assert_eq!(stub.calls(), 1);
		assert!(matches!(first, Err(Error::Exchange(ExchangeError::Status { status: 500, .. }))));
		assert!(matches!(second, Err(Error::Exchange(ExchangeError::Status { status: 500, .. }))));
		assert_eq!(request.status(), RequestStatus::Expired);

		let retried = request.get().await.expect("Retry after failure should succeed.");

		assert_eq!(retried.expose(), "token-2");
		assert_eq!(stub.calls(), 2);
	}

	#[tokio::test]
	async fn dropped_caller_does_not_strand_the_entry() {
		let stub = Arc::new(StubAuthenticator::with_delay(StdDuration::from_millis(30)));
		let request = request(&stub, None);
		let abandoned = tokio::time::timeout(StdDuration::from_millis(5), request.get()).await;

		assert!(abandoned.is_err(), "The first caller gives up before the fetch resolves.");
		assert_eq!(request.status(), RequestStatus::Pending);

		let token = request.get().await.expect("The pending fetch should be resumed.");

		assert_eq!(token.expose(), "token-1");
		assert_eq!(stub.calls(), 1);
	}

	#[test]
	fn freshness_is_strict_and_overflow_safe() {
		let issued_at = OffsetDateTime::now_utc();
		let cached = CachedToken {
			token: AccessToken::new("t"),
			issued_at,
			valid_for: Duration::milliseconds(500),
		};

		assert!(cached.is_fresh_at(issued_at + Duration::milliseconds(499)));
		assert!(!cached.is_fresh_at(issued_at + Duration::milliseconds(500)));

		let forever = CachedToken { valid_for: Duration::MAX, ..cached };

		assert!(forever.is_fresh_at(issued_at + Duration::days(365)));
	}
}
