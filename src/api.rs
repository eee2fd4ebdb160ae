//! Wire formats for the bearer-protected API: chat completions, file uploads, and analysis.
//!
//! Every builder here produces a plain [`HttpRequest`](crate::http::HttpRequest) carrying
//! `Authorization: Bearer <token>` and `Accept: application/json`, so the executor can
//! rebuild it with a fresh credential on each attempt.

pub mod chat;
pub mod files;

pub use chat::*;
pub use files::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	http::{HttpRequest, Method, Request, header},
};

pub(crate) fn authorized_request(
	method: Method,
	url: &Url,
	credential: &Credential,
	content_type: &str,
	body: Vec<u8>,
) -> Result<HttpRequest> {
	let request = Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(header::AUTHORIZATION, credential.token.bearer_header())
		.header(header::ACCEPT, "application/json")
		.header(header::CONTENT_TYPE, content_type)
		.body(body)
		.map_err(crate::error::ConfigError::from)?;

	Ok(request)
}

pub(crate) fn decode_json<T>(operation: &'static str, body: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::MalformedResponse { operation, source })
}
