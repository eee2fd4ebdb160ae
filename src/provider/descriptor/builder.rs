// self
use crate::{
	_prelude::*,
	auth::{ModelId, ProviderId, ScopeId},
	provider::{
		GenerationParams, ModelSelection, ProviderDescriptor, ProviderEndpoints, RequestPolicy,
		descriptor::with_trailing_slash,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// API endpoint is mandatory.
	#[error("Missing API endpoint.")]
	MissingApiEndpoint,
	/// Scope is mandatory.
	#[error("Missing token scope.")]
	MissingScope,
	/// Both models must be configured.
	#[error("Missing {which} model.")]
	MissingModel {
		/// Which model slot was empty.
		which: &'static str,
	},
	/// Endpoints must use HTTP or HTTPS.
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// API paths are joined onto the base, which must end with `/`.
	#[error("The API base must end with '/': {url}.")]
	ApiBaseWithoutTrailingSlash {
		/// Base URL that failed validation.
		url: String,
	},
	/// Every policy timeout must be strictly positive.
	#[error("The {field} must be a positive duration.")]
	NonPositiveTimeout {
		/// Name of the offending policy field.
		field: &'static str,
	},
	/// Refresh margin cannot be negative.
	#[error("The refresh margin cannot be negative.")]
	NegativeRefreshMargin,
	/// Upload ceiling must allow at least one byte.
	#[error("The upload limit must be greater than zero.")]
	ZeroUploadLimit,
	/// Temperature must be a finite, non-negative number.
	#[error("Temperature must be finite and non-negative.")]
	InvalidTemperature,
	/// Completion requests must allow at least one token.
	#[error("The max_tokens value must be greater than zero.")]
	ZeroMaxTokens,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Base URL of the bearer-protected API.
	pub api_endpoint: Option<Url>,
	/// Scope requested from the token endpoint.
	pub scope: Option<ScopeId>,
	/// Model answering text prompts.
	pub chat_model: Option<ModelId>,
	/// Model analyzing uploaded files.
	pub vision_model: Option<ModelId>,
	/// Request policy.
	pub policy: RequestPolicy,
	/// Sampling defaults.
	pub generation: GenerationParams,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			token_endpoint: None,
			api_endpoint: None,
			scope: None,
			chat_model: None,
			vision_model: None,
			policy: RequestPolicy::default(),
			generation: GenerationParams::default(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the API base URL; a trailing `/` is added when missing.
	pub fn api_endpoint(mut self, url: Url) -> Self {
		self.api_endpoint = Some(url);

		self
	}

	/// Sets the token scope.
	pub fn scope(mut self, scope: ScopeId) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Sets the text model.
	pub fn chat_model(mut self, model: ModelId) -> Self {
		self.chat_model = Some(model);

		self
	}

	/// Sets the file analysis model.
	pub fn vision_model(mut self, model: ModelId) -> Self {
		self.vision_model = Some(model);

		self
	}

	/// Uses one model for both text prompts and file analysis.
	pub fn model(self, model: ModelId) -> Self {
		self.chat_model(model.clone()).vision_model(model)
	}

	/// Overrides the request policy.
	pub fn policy(mut self, policy: RequestPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Overrides the generation defaults.
	pub fn generation(mut self, generation: GenerationParams) -> Self {
		self.generation = generation;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let api_base =
			with_trailing_slash(self.api_endpoint.ok_or(ProviderDescriptorError::MissingApiEndpoint)?);

		let scope = self.scope.ok_or(ProviderDescriptorError::MissingScope)?;
		let chat = self.chat_model.ok_or(ProviderDescriptorError::MissingModel { which: "chat" })?;
		let vision =
			self.vision_model.ok_or(ProviderDescriptorError::MissingModel { which: "vision" })?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { token, api_base },
			scope,
			models: ModelSelection { chat, vision },
			policy: self.policy,
			generation: self.generation,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("api", &self.endpoints.api_base)?;

		if !self.endpoints.api_base.path().ends_with('/') {
			return Err(ProviderDescriptorError::ApiBaseWithoutTrailingSlash {
				url: self.endpoints.api_base.to_string(),
			});
		}

		validate_policy(&self.policy)?;
		validate_generation(&self.generation)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ProviderDescriptorError::UnsupportedScheme { endpoint: name, url: url.to_string() }),
	}
}

fn validate_policy(policy: &RequestPolicy) -> Result<(), ProviderDescriptorError> {
	for (field, value) in [
		("token timeout", policy.token_timeout),
		("request timeout", policy.request_timeout),
		("upload timeout", policy.upload_timeout),
		("download timeout", policy.download_timeout),
	] {
		if !value.is_positive() {
			return Err(ProviderDescriptorError::NonPositiveTimeout { field });
		}
	}

	if policy.refresh_margin.is_negative() {
		return Err(ProviderDescriptorError::NegativeRefreshMargin);
	}
	if policy.max_upload_bytes == 0 {
		return Err(ProviderDescriptorError::ZeroUploadLimit);
	}

	Ok(())
}

fn validate_generation(generation: &GenerationParams) -> Result<(), ProviderDescriptorError> {
	if !generation.temperature.is_finite() || generation.temperature < 0.0 {
		return Err(ProviderDescriptorError::InvalidTemperature);
	}
	if generation.max_tokens == 0 {
		return Err(ProviderDescriptorError::ZeroMaxTokens);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor fixture URL.")
	}

	fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptor::builder(ProviderId::new("test").expect("Provider id should be valid."))
			.token_endpoint(url("https://auth.example.com/api/v2/oauth"))
			.api_endpoint(url("https://api.example.com/api/v1"))
			.scope(ScopeId::new("API_PERS").expect("Scope should be valid."))
			.model(ModelId::new("vision-pro").expect("Model should be valid."))
	}

	#[test]
	fn build_normalizes_api_base() {
		let descriptor = builder().build().expect("Descriptor should build.");

		assert_eq!(descriptor.endpoints.api_base.as_str(), "https://api.example.com/api/v1/");
		assert_eq!(descriptor.models.chat, descriptor.models.vision);
	}

	#[test]
	fn build_requires_endpoints_scope_and_models() {
		let id = ProviderId::new("bare").expect("Provider id should be valid.");
		let err = ProviderDescriptor::builder(id.clone())
			.build()
			.expect_err("Missing token endpoint should be rejected.");

		assert_eq!(err, ProviderDescriptorError::MissingTokenEndpoint);

		let err = ProviderDescriptor::builder(id)
			.token_endpoint(url("https://auth.example.com/token"))
			.api_endpoint(url("https://api.example.com/"))
			.scope(ScopeId::new("API_PERS").expect("Scope should be valid."))
			.chat_model(ModelId::new("chat").expect("Model should be valid."))
			.build()
			.expect_err("Missing vision model should be rejected.");

		assert_eq!(err, ProviderDescriptorError::MissingModel { which: "vision" });
	}

	#[test]
	fn build_rejects_non_http_schemes() {
		let err = builder()
			.token_endpoint(url("ftp://auth.example.com/token"))
			.build()
			.expect_err("FTP endpoints should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::UnsupportedScheme { endpoint: "token", .. }));
	}

	#[test]
	fn validate_rejects_api_base_without_trailing_slash() {
		let mut descriptor = builder().build().expect("Descriptor should build.");

		descriptor.endpoints.api_base = url("https://api.example.com/api/v1");

		assert_eq!(
			descriptor.validate(),
			Err(ProviderDescriptorError::ApiBaseWithoutTrailingSlash {
				url: "https://api.example.com/api/v1".into(),
			})
		);
	}

	#[test]
	fn build_rejects_invalid_policy() {
		let policy = RequestPolicy { upload_timeout: Duration::ZERO, ..RequestPolicy::default() };
		let err = builder().policy(policy).build().expect_err("Zero timeout should be rejected.");

		assert_eq!(err, ProviderDescriptorError::NonPositiveTimeout { field: "upload timeout" });

		let policy = RequestPolicy { max_upload_bytes: 0, ..RequestPolicy::default() };
		let err = builder().policy(policy).build().expect_err("Zero limit should be rejected.");

		assert_eq!(err, ProviderDescriptorError::ZeroUploadLimit);

		let generation = GenerationParams { temperature: f32::NAN, ..GenerationParams::default() };
		let err =
			builder().generation(generation).build().expect_err("NaN temperature should fail.");

		assert_eq!(err, ProviderDescriptorError::InvalidTemperature);
	}
}
