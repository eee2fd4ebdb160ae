//! Strongly typed identifiers for providers, scopes, models, and uploaded files.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

macro_rules! identifiers {
	($($(#[$meta:meta])* $name:ident => $kind:literal;)+) => {$(
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				validate_view($kind, &value)?;

				Ok(Self(value))
			}

			/// Borrows the identifier text.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl PartialEq<str> for $name {
			fn eq(&self, other: &str) -> bool {
				self.0 == other
			}
		}
		impl PartialEq<&str> for $name {
			fn eq(&self, other: &&str) -> bool {
				self.0 == *other
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	)+};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (provider, scope, model, file).
		kind: &'static str,
	},
	/// The identifier contains whitespace or control characters.
	#[error("{kind} identifier contains whitespace or control characters.")]
	ContainsWhitespace {
		/// Kind of identifier (provider, scope, model, file).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte length.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Kind of identifier (provider, scope, model, file).
		kind: &'static str,
		/// Maximum permitted length in bytes.
		max: usize,
	},
}

identifiers! {
	/// Name of a configured provider descriptor.
	ProviderId => "Provider";
	/// Scope requested from the token endpoint, sent verbatim as the `scope` form field.
	ScopeId => "Scope";
	/// Model name sent with completion requests.
	ModelId => "Model";
	/// Identifier the API assigns to an uploaded file.
	FileId => "File";
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(|c| c.is_whitespace() || c.is_control()) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scope_and_model_validation() {
		let scope = ScopeId::new("API_PERS").expect("Scope fixture should be valid.");

		assert_eq!(scope, "API_PERS");
		assert_eq!(format!("{scope:?}"), "ScopeId(API_PERS)");
		assert_eq!(ScopeId::new("API PERS"), Err(IdentifierError::ContainsWhitespace { kind: "Scope" }));
		assert_eq!(ModelId::new(""), Err(IdentifierError::Empty { kind: "Model" }));
		assert!(ModelId::new("vision\u{7}pro").is_err(), "Control characters must be rejected.");
		assert!(ProviderId::new(format!("p{}x", '\u{00A0}')).is_err());
	}

	#[test]
	fn file_ids_from_api_responses_are_validated() {
		let id: FileId =
			serde_json::from_str("\"3f1c-42\"").expect("File id should deserialize successfully.");

		assert_eq!(id.as_str(), "3f1c-42");
		assert_eq!(serde_json::to_value(&id).expect("File id should serialize."), "3f1c-42");
		assert!(serde_json::from_str::<FileId>("\"\"").is_err());
		assert!(
			FileId::new("f".repeat(IDENTIFIER_MAX_LEN + 1)).is_err(),
			"Overlong identifiers must be rejected."
		);
		FileId::new("f".repeat(IDENTIFIER_MAX_LEN)).expect("Identifier at the limit is accepted.");
	}

	#[test]
	fn borrow_allows_str_lookup() {
		let map = HashMap::from([(ModelId::new("chat-lite").expect("Model should be valid."), 1_u8)]);

		assert_eq!(map.get("chat-lite"), Some(&1));
	}
}
