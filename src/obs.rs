//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `model_broker.operation`
//!   with the `operation` and `stage` fields, plus events for credential rejections and
//!   refreshes.
//! - Enable `metrics` to increment the `model_broker_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `model_broker_auth_retry_total` counter for every forced refresh.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Token-issuing call.
	Token,
	/// Chat completion for a text prompt.
	Chat,
	/// File upload.
	Upload,
	/// Chat completion over an uploaded file.
	Analyze,
	/// Download, dedup lookup, and analysis of external content.
	Ingest,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Token => "token",
			OperationKind::Chat => "chat",
			OperationKind::Upload => "upload",
			OperationKind::Analyze => "analyze",
			OperationKind::Ingest => "ingest",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of `result` for `kind`.
pub fn record_result<T>(kind: OperationKind, result: &Result<T>) {
	match result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(_err) => {
			record_operation_outcome(kind, OperationOutcome::Failure);
			#[cfg(feature = "tracing")]
			::tracing::debug!(operation = kind.as_str(), error = %_err, "Operation failed.");
		},
	}
}
