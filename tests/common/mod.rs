//! Scripted in-process transport shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	io,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use model_broker::{
	auth::{AuthorizationKey, ModelId, ProviderId, ScopeId},
	flows::Broker,
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse, StatusCode, header},
	provider::{DefaultProviderStrategy, ProviderDescriptor, RequestPolicy},
	url::Url,
};

pub const TOKEN_PATH: &str = "/api/v2/oauth";
pub const CHAT_PATH: &str = "/api/v1/chat/completions";
pub const FILES_PATH: &str = "/api/v1/files";
pub const AUTH_KEY: &str = "c2NyaXB0ZWQ6a2V5";

/// Canned reply for one request.
#[derive(Clone, Debug)]
pub struct Reply {
	pub status: u16,
	pub body: String,
	pub delay: Option<std::time::Duration>,
}
impl Reply {
	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into(), delay: None }
	}

	pub fn completion(text: &str) -> Self {
		Self::json(200, serde_json::json!({ "choices": [{ "message": { "content": text } }] }).to_string())
	}

	pub fn unauthorized() -> Self {
		Self::json(401, r#"{"status":401,"message":"Token has expired"}"#)
	}

	pub fn delayed(mut self, delay: std::time::Duration) -> Self {
		self.delay = Some(delay);

		self
	}
}

/// Request observed by the fake transport.
#[derive(Clone, Debug)]
pub struct RecordedCall {
	pub path: String,
	pub authorization: Option<String>,
	pub content_type: Option<String>,
	pub body: Vec<u8>,
}

/// Fake [`ApiHttpClient`] with per-path reply queues.
///
/// The token endpoint issues `token-<n>` valid for `token_ttl` unless replies were queued
/// for it. Unscripted API calls answer 500.
#[derive(Debug)]
pub struct ScriptedClient {
	replies: Mutex<HashMap<String, VecDeque<Reply>>>,
	calls: Mutex<Vec<RecordedCall>>,
	issued: AtomicU64,
	token_ttl: Duration,
	token_delay: Option<std::time::Duration>,
}
impl ScriptedClient {
	pub fn new() -> Self {
		Self {
			replies: Default::default(),
			calls: Default::default(),
			issued: AtomicU64::new(0),
			token_ttl: Duration::hours(1),
			token_delay: None,
		}
	}

	pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
		self.token_ttl = ttl;

		self
	}

	pub fn with_token_delay(mut self, delay: std::time::Duration) -> Self {
		self.token_delay = Some(delay);

		self
	}

	pub fn push(&self, path: &str, reply: Reply) {
		self.replies.lock().entry(path.to_owned()).or_default().push_back(reply);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().clone()
	}

	pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
		self.calls.lock().iter().filter(|call| call.path == path).cloned().collect()
	}

	pub fn tokens_issued(&self) -> u64 {
		self.issued.load(Ordering::SeqCst)
	}

	fn next_reply(&self, path: &str) -> Reply {
		if let Some(reply) = self.replies.lock().get_mut(path).and_then(VecDeque::pop_front) {
			return reply;
		}
		if path == TOKEN_PATH {
			let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
			let expires_at = OffsetDateTime::now_utc() + self.token_ttl;
			let body = serde_json::json!({
				"access_token": format!("token-{n}"),
				"expires_at": (expires_at.unix_timestamp_nanos() / 1_000_000) as i64,
			});
			let reply = Reply::json(200, body.to_string());

			return match self.token_delay {
				Some(delay) => reply.delayed(delay),
				None => reply,
			};
		}

		Reply::json(500, "unscripted")
	}
}
impl ApiHttpClient for ScriptedClient {
	type TransportError = io::Error;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let path = request.uri().path().to_owned();
		let header_value = |name| {
			request.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
		};
		let call = RecordedCall {
			path: path.clone(),
			authorization: header_value(header::AUTHORIZATION),
			content_type: header_value(header::CONTENT_TYPE),
			body: request.body().clone(),
		};

		self.calls.lock().push(call);

		let reply = self.next_reply(&path);

		Box::pin(async move {
			if let Some(delay) = reply.delay {
				tokio::time::sleep(delay).await;
			}

			let mut response = HttpResponse::new(reply.body.into_bytes());

			*response.status_mut() =
				StatusCode::from_u16(reply.status).map_err(|e| io::Error::other(e.to_string()))?;

			Ok(response)
		})
	}
}

pub fn descriptor(policy: RequestPolicy) -> ProviderDescriptor {
	ProviderDescriptor::builder(ProviderId::new("scripted").expect("Provider id should be valid."))
		.token_endpoint(
			Url::parse(&format!("http://broker.test{TOKEN_PATH}"))
				.expect("Token endpoint fixture should parse."),
		)
		.api_endpoint(Url::parse("http://broker.test/api/v1").expect("API fixture should parse."))
		.scope(ScopeId::new("API_PERS").expect("Scope should be valid."))
		.chat_model(ModelId::new("chat-lite").expect("Model should be valid."))
		.vision_model(ModelId::new("vision-pro").expect("Model should be valid."))
		.policy(policy)
		.build()
		.expect("Descriptor fixture should build.")
}

pub fn broker_with(
	client: Arc<ScriptedClient>,
	policy: RequestPolicy,
) -> Broker<ScriptedClient> {
	Broker::with_http_client(
		descriptor(policy),
		Arc::new(DefaultProviderStrategy),
		AuthorizationKey::new(AUTH_KEY),
		client,
	)
	.expect("Broker fixture should build.")
}

pub fn broker(client: Arc<ScriptedClient>) -> Broker<ScriptedClient> {
	broker_with(client, RequestPolicy::default())
}
