//! Chat completion request and response bodies.

// self
use crate::{
	_prelude::*,
	api,
	auth::{Credential, FileId, ModelId},
	http::{HttpRequest, HttpResponse, Method},
	provider::GenerationParams,
};

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Instructions framing the conversation.
	System,
	/// End-user input.
	User,
	/// Earlier model output.
	Assistant,
}

/// Single chat message, optionally referencing uploaded files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	/// Message author.
	pub role: Role,
	/// Message text.
	pub content: String,
	/// Uploaded files the model should read alongside the text.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub attachments: Vec<FileId>,
}
impl Message {
	/// Creates a user message.
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into(), attachments: Vec::new() }
	}

	/// Creates a system message.
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: Role::System, content: content.into(), attachments: Vec::new() }
	}

	/// Attaches an uploaded file.
	pub fn with_attachment(mut self, file: FileId) -> Self {
		self.attachments.push(file);

		self
	}
}

/// Body of `POST <api>/chat/completions`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
	/// Model answering the request.
	pub model: ModelId,
	/// Conversation so far.
	pub messages: Vec<Message>,
	/// Sampling temperature.
	pub temperature: f32,
	/// Upper bound on generated tokens.
	pub max_tokens: u32,
}
impl ChatRequest {
	/// Creates a request using the provider's generation defaults.
	pub fn new(model: ModelId, messages: Vec<Message>, params: &GenerationParams) -> Self {
		Self { model, messages, temperature: params.temperature, max_tokens: params.max_tokens }
	}

	/// Creates the analysis request: one user message carrying `prompt` and the uploaded file.
	pub fn analysis(
		model: ModelId,
		prompt: impl Into<String>,
		file: FileId,
		params: &GenerationParams,
	) -> Self {
		Self::new(model, vec![Message::user(prompt).with_attachment(file)], params)
	}

	/// Serializes the request once so retries can reuse the bytes.
	pub fn encode(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self).map_err(crate::error::ConfigError::from)?)
	}
}

/// Builds an authorized completion request from an encoded body.
pub fn build_chat_request(url: &Url, credential: &Credential, body: Vec<u8>) -> Result<HttpRequest> {
	api::authorized_request(Method::POST, url, credential, "application/json", body)
}

#[derive(Deserialize)]
struct CompletionResponse {
	#[serde(default)]
	choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
	message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
	content: Option<String>,
}

/// Extracts the first choice's text.
///
/// Invalid JSON yields [`Error::MalformedResponse`]; a body without choices or with blank
/// content yields [`Error::EmptyResult`].
pub fn decode_completion(operation: &'static str, response: HttpResponse) -> Result<String> {
	let parsed: CompletionResponse = api::decode_json(operation, response.body())?;

	parsed
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.message)
		.and_then(|message| message.content)
		.filter(|content| !content.trim().is_empty())
		.ok_or(Error::EmptyResult { operation })
}
