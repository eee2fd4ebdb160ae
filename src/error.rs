//! Broker-level error types shared across the token manager, executor, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Download collaborator failure.
	#[error(transparent)]
	Fetch(#[from] crate::content::FetchError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A single guarded operation exceeded its deadline.
	#[error("Operation timed out after {timeout}.")]
	TimedOut {
		/// Deadline that elapsed.
		timeout: Duration,
	},
	/// The token endpoint failed or returned an unusable response.
	#[error("Credential is unavailable: {reason}.")]
	CredentialUnavailable {
		/// Broker-supplied reason string.
		reason: String,
		/// Underlying failure, when one exists.
		#[source]
		source: Option<Box<Error>>,
	},
	/// The API kept rejecting the credential after every allowed retry.
	#[error("Authorization failed after {attempts} attempts: {detail}.")]
	AuthExhausted {
		/// Total number of requests sent.
		attempts: u32,
		/// Body preview of the last rejection.
		detail: String,
	},
	/// The API answered with a non-success status other than an authorization failure.
	#[error("Request failed with status {status}: {detail}.")]
	RequestFailed {
		/// HTTP status code.
		status: u16,
		/// Body preview returned by the API.
		detail: String,
	},
	/// A successful response did not carry the expected content.
	#[error("The {operation} response did not contain a result.")]
	EmptyResult {
		/// Operation label.
		operation: &'static str,
	},
	/// A successful response body could not be decoded.
	#[error("The {operation} response is malformed.")]
	MalformedResponse {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Content exceeds the local upload ceiling; nothing was sent.
	#[error("Payload of {size} bytes exceeds the {limit}-byte limit.")]
	PayloadTooLarge {
		/// Size of the rejected payload.
		size: usize,
		/// Configured ceiling.
		limit: usize,
	},
}
impl Error {
	/// Wraps a failure raised while obtaining a credential.
	pub fn credential_unavailable(reason: impl Into<String>, source: Option<Error>) -> Self {
		Self::CredentialUnavailable { reason: reason.into(), source: source.map(Box::new) }
	}

	/// Returns `true` for [`Error::TimedOut`], including one nested inside
	/// [`Error::CredentialUnavailable`].
	pub fn is_timeout(&self) -> bool {
		match self {
			Self::TimedOut { .. } => true,
			Self::CredentialUnavailable { source: Some(inner), .. } => inner.is_timeout(),
			_ => false,
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded.")]
	RequestEncoding(#[from] serde_json::Error),
	/// Endpoint URL cannot be joined or parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Deadlines must be strictly positive.
	#[error("Timeout must be a positive duration, got {timeout}.")]
	NonPositiveTimeout {
		/// Rejected duration.
		timeout: Duration,
	},
	/// Prompts must contain non-whitespace text.
	#[error("Prompt must not be empty.")]
	EmptyPrompt,
	/// Upload metadata would end up in a part header and contains control characters.
	#[error("The upload {field} must not contain control characters.")]
	InvalidUploadField {
		/// Name of the rejected field.
		field: &'static str,
	},
	/// Multipart upload body could not be produced.
	#[error("Upload body could not be encoded.")]
	UploadEncoding {
		/// Encoder failure, including an unparseable MIME type.
		#[source]
		source: ReqwestError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
	/// HTTP client reported a failure without a typed source.
	#[error("HTTP client error: {0}.")]
	Other(String),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
