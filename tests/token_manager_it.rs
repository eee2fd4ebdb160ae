mod common;

// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use common::{AUTH_KEY, Reply, ScriptedClient, TOKEN_PATH};
use model_broker::{
	auth::AuthorizationKey,
	error::Error,
	provider::RequestPolicy,
	token::{TokenManager, TokenState},
};

fn manager(client: Arc<ScriptedClient>, policy: RequestPolicy) -> TokenManager<ScriptedClient> {
	TokenManager::new(client, &common::descriptor(policy), AuthorizationKey::new(AUTH_KEY))
		.expect("Token manager fixture should build.")
}

#[tokio::test]
async fn first_use_issues_and_then_serves_from_cache() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());

	assert_eq!(tokens.state(), TokenState::Uninitialized);
	assert!(tokens.snapshot().is_none());

	let first = tokens.ensure_valid(false).await.expect("First credential should be issued.");
	let second = tokens.ensure_valid(false).await.expect("Cached credential should be reused.");

	assert_eq!(first.token.expose(), "token-1");
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(tokens.state(), TokenState::Valid);
	assert_eq!(client.tokens_issued(), 1);
	assert_eq!(tokens.metrics().gate_entries(), 1);
}

#[tokio::test]
async fn issuing_request_carries_static_key_scope_and_request_id() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());

	tokens.ensure_valid(false).await.expect("Credential should be issued.");

	let calls = client.calls_to(TOKEN_PATH);

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].authorization.as_deref(), Some("Basic c2NyaXB0ZWQ6a2V5"));
	assert_eq!(calls[0].content_type.as_deref(), Some("application/x-www-form-urlencoded"));
	assert_eq!(calls[0].body, b"scope=API_PERS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_issuing_call() {
	let client =
		Arc::new(ScriptedClient::new().with_token_delay(std::time::Duration::from_millis(50)));
	let tokens = Arc::new(manager(client.clone(), RequestPolicy::default()));
	let handles = (0..16)
		.map(|_| {
			let tokens = tokens.clone();

			tokio::spawn(async move { tokens.ensure_valid(false).await })
		})
		.collect::<Vec<_>>();
	let mut issued = Vec::new();

	for handle in handles {
		let credential = handle
			.await
			.expect("Caller task should not panic.")
			.expect("Every caller should receive a credential.");

		issued.push(credential.token.expose().to_owned());
	}

	assert!(issued.iter().all(|token| token == "token-1"), "{issued:?}");
	assert_eq!(client.tokens_issued(), 1);
	assert_eq!(tokens.metrics().issue_calls(), 1);
}

#[tokio::test]
async fn credential_inside_margin_is_refreshed() {
	// Lifetime shorter than the 60 second margin: never considered fresh.
	let client = Arc::new(ScriptedClient::new().with_token_ttl(Duration::seconds(30)));
	let tokens = manager(client.clone(), RequestPolicy::default());
	let first = tokens.ensure_valid(false).await.expect("First credential should be issued.");

	assert_eq!(tokens.state(), TokenState::NearExpiry);

	let second = tokens.ensure_valid(false).await.expect("Stale credential should be replaced.");

	assert_eq!(first.token.expose(), "token-1");
	assert_eq!(second.token.expose(), "token-2");
	assert_eq!(client.tokens_issued(), 2);
}

#[tokio::test]
async fn forced_refresh_always_issues() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());

	tokens.ensure_valid(false).await.expect("First credential should be issued.");

	let forced = tokens.ensure_valid(true).await.expect("Forced refresh should succeed.");

	assert_eq!(forced.token.expose(), "token-2");
	assert_eq!(client.tokens_issued(), 2);
}

#[tokio::test]
async fn rejected_credential_is_replaced_once() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());
	let rejected = tokens.ensure_valid(false).await.expect("First credential should be issued.");
	let replacement =
		tokens.refresh_after_rejection(&rejected).await.expect("Replacement should be issued.");
	let late = tokens
		.refresh_after_rejection(&rejected)
		.await
		.expect("A late caller should reuse the replacement.");

	assert_eq!(replacement.token.expose(), "token-2");
	assert!(Arc::ptr_eq(&replacement, &late));
	assert_eq!(client.tokens_issued(), 2);

	let third = tokens
		.refresh_after_rejection(&replacement)
		.await
		.expect("Rejecting the replacement should issue again.");

	assert_eq!(third.token.expose(), "token-3");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_credential() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());
	let original = tokens.ensure_valid(false).await.expect("First credential should be issued.");

	client.push(TOKEN_PATH, Reply::json(503, "maintenance"));

	let err = tokens.ensure_valid(true).await.expect_err("Rejected refresh should fail.");

	assert!(matches!(err, Error::CredentialUnavailable { .. }), "{err:?}");
	assert!(err.to_string().contains("503"));
	assert_eq!(tokens.state(), TokenState::Unrecoverable);

	let kept = tokens.snapshot().expect("Previous credential should remain cached.");

	assert!(Arc::ptr_eq(&kept, &original));
	assert_eq!(tokens.metrics().failures(), 1);

	let recovered = tokens.ensure_valid(true).await.expect("Next refresh should succeed.");

	assert_eq!(recovered.token.expose(), "token-2");
	assert_eq!(tokens.state(), TokenState::Valid);
}

#[tokio::test]
async fn unusable_token_responses_are_credential_failures() {
	let client = Arc::new(ScriptedClient::new());
	let tokens = manager(client.clone(), RequestPolicy::default());

	for body in [
		"not json",
		r#"{"expires_at":1900000000000}"#,
		r#"{"access_token":"","expires_at":1900000000000}"#,
		r#"{"access_token":"abc"}"#,
		r#"{"access_token":"abc","expires_at":9223372036854775807}"#,
	] {
		client.push(TOKEN_PATH, Reply::json(200, body));

		let err = tokens.ensure_valid(false).await.expect_err("Body should be rejected.");

		assert!(matches!(err, Error::CredentialUnavailable { .. }), "{body}: {err:?}");
	}

	assert!(tokens.snapshot().is_none());
	assert_eq!(client.tokens_issued(), 0);
}

#[tokio::test]
async fn slow_token_endpoint_times_out() {
	let client =
		Arc::new(ScriptedClient::new().with_token_delay(std::time::Duration::from_secs(5)));
	let policy = RequestPolicy { token_timeout: Duration::milliseconds(50), ..Default::default() };
	let tokens = manager(client, policy);
	let err = tokens.ensure_valid(false).await.expect_err("Slow token call should time out.");

	assert!(matches!(err, Error::CredentialUnavailable { .. }));
	assert!(err.is_timeout(), "Timeout should be visible through the wrapper: {err:?}");
	assert_eq!(tokens.state(), TokenState::Unrecoverable);
}
