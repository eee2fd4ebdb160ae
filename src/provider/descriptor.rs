//! Provider descriptor data structures and helpers shared by all operations.
//!
//! The module exposes validated metadata, supporting builder utilities, and the request
//! policy so providers can be described in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Timeouts, retry ceiling, and generation defaults.
pub mod policy;

pub use builder::*;
pub use policy::*;

// self
use crate::{
	_prelude::*,
	auth::{ModelId, ProviderId, ScopeId},
	error::ConfigError,
};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Token endpoint that exchanges the static key for a bearer token.
	pub token: Url,
	/// Base URL of the bearer-protected API; always ends with `/`.
	#[serde(deserialize_with = "deserialize_api_base")]
	pub api_base: Url,
}
impl ProviderEndpoints {
	/// Chat completion endpoint.
	pub fn chat_completions(&self) -> Result<Url, ConfigError> {
		self.api_url("chat/completions")
	}

	/// File upload endpoint.
	pub fn files(&self) -> Result<Url, ConfigError> {
		self.api_url("files")
	}

	fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		self.api_base.join(path).map_err(|source| ConfigError::InvalidEndpoint { source })
	}
}

/// Appends the `/` that [`Url::join`] needs to keep the last path segment.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

fn deserialize_api_base<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Url::deserialize(deserializer).map(with_trailing_slash)
}

/// Models used for text prompts and for file analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
	/// Model answering plain text prompts.
	pub chat: ModelId,
	/// Model analyzing uploaded files.
	pub vision: ModelId,
}

/// Immutable provider descriptor consumed by the broker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scope requested from the token endpoint.
	pub scope: ScopeId,
	/// Model names.
	pub models: ModelSelection,
	/// Timeouts, retry ceiling, refresh margin, and upload limit.
	#[serde(default)]
	pub policy: RequestPolicy,
	/// Sampling defaults for completion requests.
	#[serde(default)]
	pub generation: GenerationParams,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}
}
