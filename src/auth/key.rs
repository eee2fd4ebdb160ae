//! Long-lived authorization key used only against the token endpoint.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::_prelude::*;

/// Pre-shared static key presented as `Authorization: Basic <key>`.
///
/// The provider hands out the key already encoded, so [`AuthorizationKey::new`] keeps it
/// as-is. [`AuthorizationKey::from_client_credentials`] builds the same value from a raw
/// client id and secret. The key does not implement `Serialize`; load it from the
/// environment or a secret store.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationKey(String);
impl AuthorizationKey {
	/// Wraps an already-encoded key without altering it.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Encodes `client_id:client_secret` with standard base64.
	pub fn from_client_credentials(client_id: &str, client_secret: &str) -> Self {
		Self(STANDARD.encode(format!("{client_id}:{client_secret}")))
	}

	/// Returns the raw key. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value for the token endpoint.
	pub fn basic_header(&self) -> String {
		format!("Basic {}", self.0)
	}
}
impl Debug for AuthorizationKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AuthorizationKey").field(&"<redacted>").finish()
	}
}
