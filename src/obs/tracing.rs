// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("model_broker.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits an event when the API rejects a credential.
pub fn trace_credential_rejected(kind: OperationKind, attempt: u32, allowed: u32) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation = kind.as_str(), attempt, allowed, "API rejected the credential.");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, attempt, allowed);
}

/// Emits an event after the token endpoint issued a credential.
pub fn trace_credential_issued(expires_at: OffsetDateTime, forced: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%expires_at, forced, "Issued a new credential.");
	#[cfg(not(feature = "tracing"))]
	let _ = (expires_at, forced);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn events_do_not_panic_without_subscriber() {
		trace_credential_rejected(OperationKind::Chat, 1, 3);
		trace_credential_issued(OffsetDateTime::UNIX_EPOCH, false);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::Analyze, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
