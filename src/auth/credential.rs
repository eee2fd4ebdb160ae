//! Immutable bearer credential snapshot.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token value paired with the instant it stops being accepted.
///
/// The token manager publishes each issued credential as an `Arc<Credential>`, so a reader
/// always sees a token together with its own expiry.
#[derive(Clone)]
pub struct Credential {
	/// Bearer token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Expiry instant reported by the token endpoint.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential from a token and expiry.
	pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { token: TokenSecret::new(token), expires_at }
	}

	/// Time left before expiry, negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}

	/// Returns `true` while more than `margin` remains before expiry.
	pub fn is_fresh_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		self.remaining_at(now) > margin
	}

	/// Returns `true` once the expiry instant has passed.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &self.token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
