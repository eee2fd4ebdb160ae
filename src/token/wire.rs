//! Token endpoint request and response formats.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationKey, Credential, ScopeId},
	http::{HttpRequest, HttpResponse, Method, Request, header},
};

/// Header carrying the per-call request identifier.
pub const REQUEST_ID_HEADER: &str = "RqUID";

#[derive(Deserialize)]
struct TokenResponse {
	access_token: Option<String>,
	expires_at: Option<i64>,
}

/// Builds the issuing request: form body `scope=<scope>`, Basic key, fresh request id.
pub fn build_token_request(
	endpoint: &Url,
	key: &AuthorizationKey,
	scope: &ScopeId,
) -> Result<HttpRequest> {
	let body = form_urlencoded::Serializer::new(String::new())
		.append_pair("scope", scope.as_ref())
		.finish()
		.into_bytes();
	let request = Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(header::AUTHORIZATION, key.basic_header())
		.header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
		.header(header::ACCEPT, "application/json")
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(body)
		.map_err(crate::error::ConfigError::from)?;

	Ok(request)
}

/// Parses a token endpoint response into a [`Credential`].
///
/// Any non-success status, malformed body, missing or empty token, or unusable expiry is
/// reported as [`Error::CredentialUnavailable`].
pub fn parse_token_response(response: &HttpResponse) -> Result<Credential> {
	let status = response.status();

	if !status.is_success() {
		let preview = String::from_utf8_lossy(response.body());

		return Err(Error::credential_unavailable(
			format!("token endpoint returned status {}: {}", status.as_u16(), preview.trim()),
			None,
		));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| {
			Error::credential_unavailable(format!("token response is malformed at {}", e.path()), None)
		})?;
	let token = parsed
		.access_token
		.filter(|token| !token.trim().is_empty())
		.ok_or_else(|| Error::credential_unavailable("token response has no access_token", None))?;
	let expires_at = parsed
		.expires_at
		.ok_or_else(|| Error::credential_unavailable("token response has no expires_at", None))?;
	let expires_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(expires_at) * 1_000_000)
		.map_err(|_| Error::credential_unavailable("token expiry is out of range", None))?;

	Ok(Credential::new(token, expires_at))
}
