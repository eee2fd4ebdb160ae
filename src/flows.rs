//! High-level operations powered by the broker facade.

pub mod ingest;

pub use ingest::*;

// self
use crate::{
	_prelude::*,
	api::{self, ChatRequest, EncodedUpload, Message},
	auth::{AuthorizationKey, FileId},
	content::FetchedContent,
	deadline::Deadline,
	error::ConfigError,
	executor::AuthorizedExecutor,
	http::{ApiHttpClient, ReqwestHttpClient},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::{ProviderDescriptor, ProviderStrategy},
	token::TokenManager,
};

/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient>;

/// Sends prompts, uploads, and analysis requests to one provider.
///
/// The broker owns the shared [`TokenManager`] and [`AuthorizedExecutor`], so clones share
/// one credential and one refresh gate. Every call is time-boxed by the descriptor's
/// [`RequestPolicy`](crate::provider::RequestPolicy) and retried at most
/// `max_auth_retries` times after the API rejects the credential.
pub struct Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	descriptor: Arc<ProviderDescriptor>,
	executor: Arc<AuthorizedExecutor<C>>,
	request_deadline: Deadline,
	upload_deadline: Deadline,
	chat_url: Url,
	files_url: Url,
}
impl<C> Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		key: AuthorizationKey,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		descriptor.validate().map_err(ConfigError::from)?;

		let http_client = http_client.into();
		let tokens = Arc::new(TokenManager::new(http_client.clone(), &descriptor, key)?);
		let executor = AuthorizedExecutor::new(
			http_client,
			tokens,
			strategy,
			descriptor.policy.max_auth_retries,
		);

		Ok(Self {
			request_deadline: Deadline::new(descriptor.policy.request_timeout)?,
			upload_deadline: Deadline::new(descriptor.policy.upload_timeout)?,
			chat_url: descriptor.endpoints.chat_completions()?,
			files_url: descriptor.endpoints.files()?,
			executor: Arc::new(executor),
			descriptor: Arc::new(descriptor),
		})
	}

	/// Provider descriptor driving this broker.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Token manager shared by every operation.
	pub fn tokens(&self) -> &Arc<TokenManager<C>> {
		self.executor.tokens()
	}

	/// Sends a single user prompt to the chat model and returns its reply.
	pub async fn send_prompt(&self, prompt: &str) -> Result<String> {
		if prompt.trim().is_empty() {
			return Err(ConfigError::EmptyPrompt.into());
		}

		self.chat(vec![Message::user(prompt)]).await
	}

	/// Sends a conversation to the chat model and returns the first choice.
	pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
		let request =
			ChatRequest::new(self.descriptor.models.chat.clone(), messages, &self.descriptor.generation);

		self.complete(OperationKind::Chat, "chat", request).await
	}

	/// Uploads a file and returns the identifier the API assigned to it.
	///
	/// Content over `max_upload_bytes` fails with [`Error::PayloadTooLarge`] before any
	/// network call, including the token request.
	pub async fn upload_file(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<FileId> {
		const KIND: OperationKind = OperationKind::Upload;

		let limit = self.descriptor.policy.max_upload_bytes;

		observe(KIND, "upload_file", async {
			if bytes.len() > limit {
				return Err(Error::PayloadTooLarge { size: bytes.len(), limit });
			}

			let upload = EncodedUpload::encode(filename, mime_type, bytes).await?;

			self.executor
				.execute(
					KIND,
					self.upload_deadline,
					|credential| upload.to_request(&self.files_url, credential),
					api::decode_upload,
				)
				.await
		})
		.await
	}

	/// Asks the vision model about a previously uploaded file.
	pub async fn analyze_file(&self, file: FileId, prompt: &str) -> Result<String> {
		if prompt.trim().is_empty() {
			return Err(ConfigError::EmptyPrompt.into());
		}

		let request = ChatRequest::analysis(
			self.descriptor.models.vision.clone(),
			prompt,
			file,
			&self.descriptor.generation,
		);

		self.complete(OperationKind::Analyze, "analyze_file", request).await
	}

	/// Uploads `content` and analyzes it with `prompt`.
	pub async fn analyze_bytes(&self, content: &FetchedContent, prompt: &str) -> Result<String> {
		if prompt.trim().is_empty() {
			return Err(ConfigError::EmptyPrompt.into());
		}

		let file = self.upload_file(&content.filename, &content.mime_type, &content.bytes).await?;

		self.analyze_file(file, prompt).await
	}

	async fn complete(
		&self,
		kind: OperationKind,
		stage: &'static str,
		request: ChatRequest,
	) -> Result<String> {
		let body = request.encode()?;

		observe(
			kind,
			stage,
			self.executor.execute(
				kind,
				self.request_deadline,
				|credential| api::build_chat_request(&self.chat_url, credential, body.clone()),
				|response| api::decode_completion(kind.as_str(), response),
			),
		)
		.await
	}
}
impl Broker<ReqwestHttpClient> {
	/// Creates a broker with its own reqwest-backed transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		key: AuthorizationKey,
	) -> Result<Self> {
		Self::with_http_client(descriptor, strategy, key, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			descriptor: self.descriptor.clone(),
			executor: self.executor.clone(),
			request_deadline: self.request_deadline,
			upload_deadline: self.upload_deadline,
			chat_url: self.chat_url.clone(),
			files_url: self.files_url.clone(),
		}
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor.id)
			.field("executor", &self.executor)
			.finish()
	}
}

async fn observe<F, T>(kind: OperationKind, stage: &'static str, operation: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	obs::record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = OperationSpan::new(kind, stage).instrument(operation).await;

	obs::record_result(kind, &result);

	result
}
