mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use oauth2_jwt_broker::{
	cache::{RequestStatus, TokenCache},
	error::{Error, ExchangeError},
};
// self
use common::{CountingAuthenticator, account};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_share_one_exchange() {
	let stub = Arc::new(CountingAuthenticator::with_delay(StdDuration::from_millis(100)));
	let cache = Arc::new(TokenCache::new(stub.clone()));
	let tasks = (0..16)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move {
				let account = account("svc@project.iam", &["https://scope/a", "https://scope/b"]);

				cache.get(&account).await
			})
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let token = task
			.await
			.expect("Lookup task should not panic.")
			.expect("Shared exchange should succeed.");

		assert_eq!(token.expose(), "token-1");
	}

	assert_eq!(stub.calls(), 1);
	assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn cached_token_is_reused_until_it_expires() {
	let stub = Arc::new(CountingAuthenticator::default());
	let cache = TokenCache::new(stub.clone());
	let account = account("svc@project.iam", &["https://scope/a"]);
	let first = cache.get(&account).await.expect("First lookup should succeed.");
	let second = cache.get(&account).await.expect("Second lookup should succeed.");

	assert_eq!(first, second);
	assert_eq!(stub.calls(), 1);
	assert_eq!(cache.status(&account), Some(RequestStatus::Completed));
}

#[tokio::test]
async fn expired_token_triggers_a_refresh() {
	let stub = Arc::new(CountingAuthenticator::default());
	let cache = TokenCache::new(stub.clone());
	let mut account = account("svc@project.iam", &["https://scope/a"]);

	account.expiration = Some(time::Duration::milliseconds(500));

	let first = cache.get(&account).await.expect("Lookup at t=0 should succeed.");

	assert_eq!(stub.calls(), 1);

	tokio::time::sleep(StdDuration::from_millis(505)).await;

	assert_eq!(cache.status(&account), Some(RequestStatus::Expired));

	let second = cache.get(&account).await.expect("Lookup at t=505ms should succeed.");

	assert_eq!(stub.calls(), 2);
	assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_after_expiry_share_one_refresh() {
	let stub = Arc::new(CountingAuthenticator::with_delay(StdDuration::from_millis(50)));
	let cache = Arc::new(TokenCache::new(stub.clone()));
	let mut account = account("svc@project.iam", &["https://scope/a"]);

	account.expiration = Some(time::Duration::milliseconds(500));

	let first = cache.get(&account).await.expect("Initial lookup should succeed.");

	assert_eq!(first.expose(), "token-1");

	tokio::time::sleep(StdDuration::from_millis(600)).await;

	assert_eq!(cache.status(&account), Some(RequestStatus::Expired));

	let tasks = (0..8)
		.map(|_| {
			let cache = cache.clone();
			let account = account.clone();

			tokio::spawn(async move { cache.get(&account).await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let token = task
			.await
			.expect("Lookup task should not panic.")
			.expect("Shared refresh should succeed.");

		assert_eq!(token.expose(), "token-2");
	}

	assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn distinct_credentials_never_share_an_entry() {
	let stub = Arc::new(CountingAuthenticator::with_delay(StdDuration::from_millis(20)));
	let cache = TokenCache::new(stub.clone());
	let read = account("svc@project.iam", &["https://scope/read"]);
	let write = account("svc@project.iam", &["https://scope/write"]);
	let mut delegated = account("svc@project.iam", &["https://scope/read"]);

	delegated.delegation = Some("user@example.com".parse().expect("Delegation should parse."));

	let (a, b, c) = tokio::join!(cache.get(&read), cache.get(&write), cache.get(&delegated));
	let tokens = [a, b, c].map(|token| token.expect("Independent lookups should succeed."));

	assert_eq!(stub.calls(), 3);
	assert_eq!(cache.len(), 3);
	assert_ne!(tokens[0], tokens[1]);
	assert_ne!(tokens[1], tokens[2]);
}

#[tokio::test]
async fn identity_ignores_key_material_and_expiration() {
	let stub = Arc::new(CountingAuthenticator::default());
	let cache = TokenCache::new(stub.clone());
	let first = account("svc@project.iam", &["https://scope/a"]);
	let mut second = first.clone();

	second.expiration = Some(time::Duration::minutes(5));
	second.key = oauth2_jwt_broker::auth::KeySource::File("/elsewhere.pem".into());

	cache.get(&first).await.expect("First lookup should succeed.");
	cache.get(&second).await.expect("Second lookup should reuse the entry.");

	assert_eq!(stub.calls(), 1);
	assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn clear_forces_a_new_exchange() {
	let stub = Arc::new(CountingAuthenticator::default());
	let cache = TokenCache::new(stub.clone());
	let account = account("svc@project.iam", &["https://scope/a"]);

	cache.get(&account).await.expect("Lookup before clear should succeed.");
	cache.clear();

	assert!(cache.is_empty());

	let token = cache.get(&account).await.expect("Lookup after clear should succeed.");

	assert_eq!(token.expose(), "token-2");
	assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn failure_does_not_poison_the_entry() {
	let stub = Arc::new(CountingAuthenticator::default().failing_first(1));
	let cache = TokenCache::new(stub.clone());
	let account = account("svc@project.iam", &["https://scope/a"]);
	let err = cache.get(&account).await.expect_err("First exchange is scripted to fail.");

	assert!(matches!(err, Error::Exchange(ExchangeError::Status { status: 503, .. })));
	assert!(err.is_retryable());
	assert_eq!(cache.status(&account), Some(RequestStatus::Expired));

	let token = cache.get(&account).await.expect("Retry should start a fresh exchange.");

	assert_eq!(token.expose(), "token-2");
	assert_eq!(stub.calls(), 2);
}
