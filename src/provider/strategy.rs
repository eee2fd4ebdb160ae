//! Provider strategy hooks that classify API responses.
//!
//! The executor retries only when the strategy reports
//! [`ResponseClass::Unauthorized`]. The default strategy compares status codes; providers
//! that distinguish an expired token from a revoked one in the response body can narrow the
//! retry trigger by overriding [`ProviderStrategy::classify_response`].

// self
use crate::{_prelude::*, obs::OperationKind};

/// Strategy hook that decides how the executor treats a response.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a response into the executor's three outcomes.
	fn classify_response(&self, ctx: &ResponseContext) -> ResponseClass;
}

/// Executor outcomes for a single response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
	/// Decode the body and return it.
	Success,
	/// The credential was rejected; refresh and retry while the budget allows.
	Unauthorized,
	/// Terminal failure; never retried.
	Failure,
}

/// Context passed to provider strategies when classifying a response.
///
/// The struct keeps only primitive data so strategies stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseContext {
	/// Operation that produced the response.
	pub operation: OperationKind,
	/// HTTP status code.
	pub http_status: u16,
	/// Preview of the response body.
	pub body_preview: String,
}
impl ResponseContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a context from a status code and raw body.
	pub fn new(operation: OperationKind, http_status: u16, body: &[u8]) -> Self {
		Self {
			operation,
			http_status,
			body_preview: truncate_preview(String::from_utf8_lossy(body).into_owned()),
		}
	}
}

/// Default strategy: 2xx succeeds, 401 is an authorization failure, anything else fails.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_response(&self, ctx: &ResponseContext) -> ResponseClass {
		match ctx.http_status {
			200..=299 => ResponseClass::Success,
			401 => ResponseClass::Unauthorized,
			_ => ResponseClass::Failure,
		}
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ResponseContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ResponseContext::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_strategy_retries_only_on_401() {
		let strategy = DefaultProviderStrategy;
		let classify = |status| {
			strategy.classify_response(&ResponseContext::new(OperationKind::Chat, status, b""))
		};

		assert_eq!(classify(200), ResponseClass::Success);
		assert_eq!(classify(204), ResponseClass::Success);
		assert_eq!(classify(401), ResponseClass::Unauthorized);
		assert_eq!(classify(403), ResponseClass::Failure);
		assert_eq!(classify(429), ResponseClass::Failure);
		assert_eq!(classify(500), ResponseClass::Failure);
	}

	#[test]
	fn body_preview_is_truncated() {
		let body = "x".repeat(1_000);
		let ctx = ResponseContext::new(OperationKind::Upload, 500, body.as_bytes());

		assert_eq!(ctx.body_preview.chars().count(), ResponseContext::BODY_PREVIEW_LIMIT + 1);
		assert!(ctx.body_preview.ends_with('…'));
	}
}
