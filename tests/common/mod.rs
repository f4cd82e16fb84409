//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use oauth2_jwt_broker::{
	auth::{AccessToken, ServiceAccount},
	authenticator::{AuthFuture, Authenticator},
	error::{Error, ExchangeError},
};

/// PKCS#1 RSA private key used to sign assertions.
pub const PRIVATE_KEY: &str = include_str!("../fixtures/service-account.pem");
/// Public half of [`PRIVATE_KEY`].
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service-account.pub.pem");
/// Path of [`PRIVATE_KEY`] on disk.
pub const PRIVATE_KEY_PATH: &str =
	concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service-account.pem");

pub fn account(email: &str, scopes: &[&str]) -> ServiceAccount {
	ServiceAccount::builder(email)
		.scopes(scopes.iter().copied())
		.key_pem(PRIVATE_KEY)
		.build()
		.expect("Service account fixture should build.")
}

/// Authenticator that counts invocations, answers `token-<n>` after a delay, and fails the
/// first `failures` calls with an HTTP 503.
#[derive(Debug, Default)]
pub struct CountingAuthenticator {
	calls: AtomicUsize,
	delay: StdDuration,
	failures: usize,
}
impl CountingAuthenticator {
	pub fn with_delay(delay: StdDuration) -> Self {
		Self { delay, ..Default::default() }
	}

	pub fn failing_first(mut self, failures: usize) -> Self {
		self.failures = failures;

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl Authenticator for CountingAuthenticator {
	fn authenticate<'a>(&'a self, account: &'a ServiceAccount) -> AuthFuture<'a> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

		Box::pin(async move {
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}
			if call <= self.failures {
				return Err(Error::from(ExchangeError::Status {
					status: 503,
					oauth_error: None,
					body: format!("unavailable for {}", account.email),
				}));
			}

			Ok(AccessToken::new(format!("token-{call}")))
		})
	}
}
