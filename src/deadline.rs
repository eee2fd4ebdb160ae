//! Deadline guard that races a single pending operation against a wall-clock timer.
//!
//! [`Deadline::run`] reports exactly one outcome: the operation's own value or error, or
//! [`Error::TimedOut`] when the timer fires first. The operation future is polled ahead of
//! the timer on every wake-up, so a result that is already available always wins. When the
//! timer wins, the operation future is dropped, which cancels it without waiting for any
//! cleanup to finish.

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated, strictly positive timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline {
	timeout: Duration,
	limit: std::time::Duration,
}
impl Deadline {
	/// Creates a deadline, rejecting zero and negative durations.
	pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
		if !timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout { timeout });
		}

		let limit = std::time::Duration::try_from(timeout)
			.map_err(|_| ConfigError::NonPositiveTimeout { timeout })?;

		Ok(Self { timeout, limit })
	}

	/// Returns the configured duration.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Drives `operation` to completion unless the deadline elapses first.
	pub async fn run<F, T>(self, operation: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		match tokio::time::timeout(self.limit, operation).await {
			Ok(outcome) => outcome,
			Err(_) => Err(Error::TimedOut { timeout: self.timeout }),
		}
	}
}
impl TryFrom<Duration> for Deadline {
	type Error = ConfigError;

	fn try_from(timeout: Duration) -> Result<Self, Self::Error> {
		Self::new(timeout)
	}
}

/// Validates `timeout` and runs `operation` under it.
///
/// A non-positive timeout fails with [`ConfigError::NonPositiveTimeout`] before the
/// operation is ever polled.
pub async fn run_with_deadline<F, T>(timeout: Duration, operation: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	Deadline::new(timeout)?.run(operation).await
}
