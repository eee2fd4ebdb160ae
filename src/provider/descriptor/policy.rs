// self
use crate::_prelude::*;

/// Upload ceiling applied before any network call.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Per-operation timeouts and the authorization retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPolicy {
	/// Deadline for the token-issuing call.
	pub token_timeout: Duration,
	/// Deadline for chat completion and analysis calls.
	pub request_timeout: Duration,
	/// Deadline for file uploads.
	pub upload_timeout: Duration,
	/// Deadline for downloading content through a [`ContentSource`](crate::content::ContentSource).
	pub download_timeout: Duration,
	/// Forced refreshes allowed per operation after an authorization failure.
	pub max_auth_retries: u32,
	/// Credentials expiring within this window are refreshed before use.
	pub refresh_margin: Duration,
	/// Largest payload accepted for upload.
	pub max_upload_bytes: usize,
}
impl Default for RequestPolicy {
	fn default() -> Self {
		Self {
			token_timeout: Duration::seconds(30),
			request_timeout: Duration::seconds(60),
			upload_timeout: Duration::seconds(120),
			download_timeout: Duration::seconds(60),
			max_auth_retries: 2,
			refresh_margin: Duration::seconds(60),
			max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
		}
	}
}

/// Sampling defaults sent with every completion request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
	/// Sampling temperature.
	pub temperature: f32,
	/// Upper bound on generated tokens.
	pub max_tokens: u32,
}
impl Default for GenerationParams {
	fn default() -> Self {
		Self { temperature: 0.7, max_tokens: 1024 }
	}
}
