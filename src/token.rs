//! Bearer credential lifecycle: caching, double-checked refresh, and failure isolation.
//!
//! [`TokenManager::ensure_valid`] keeps the common case lock-free: when the cached
//! credential still has more than the refresh margin left, the snapshot is returned
//! straight from a read lock. Stale or forced requests queue on a per-manager async gate;
//! the first caller through issues a new credential while the rest re-check the snapshot
//! after acquiring the gate and reuse it, so one staleness event produces one issuing
//! call. [`TokenManager::refresh_after_rejection`] applies the same rule to credentials
//! the API refused. A failed issue leaves the previous credential in place.

mod metrics;
mod wire;

pub use metrics::RefreshMetrics;
pub use wire::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationKey, Credential, ScopeId},
	deadline::Deadline,
	http::{self, ApiHttpClient},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::ProviderDescriptor,
};

/// Lifecycle state of the cached credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
	/// No credential has been issued yet.
	Uninitialized,
	/// The credential has more than the refresh margin left.
	Valid,
	/// The credential is within the refresh margin or already expired.
	NearExpiry,
	/// The most recent issuing attempt failed; cleared by the next successful issue.
	Unrecoverable,
}

#[derive(Default)]
struct Slot {
	credential: Option<Arc<Credential>>,
	last_issue_failed: bool,
}

/// Owns the bearer credential for one provider and refreshes it on demand.
pub struct TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
	scope: ScopeId,
	key: AuthorizationKey,
	timeout: Deadline,
	refresh_margin: Duration,
	slot: RwLock<Slot>,
	gate: AsyncMutex<()>,
	metrics: Arc<RefreshMetrics>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a manager for `descriptor`'s token endpoint and scope.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		descriptor: &ProviderDescriptor,
		key: AuthorizationKey,
	) -> Result<Self> {
		Ok(Self {
			http_client: http_client.into(),
			endpoint: descriptor.endpoints.token.clone(),
			scope: descriptor.scope.clone(),
			key,
			timeout: Deadline::new(descriptor.policy.token_timeout)?,
			refresh_margin: descriptor.policy.refresh_margin,
			slot: Default::default(),
			gate: AsyncMutex::new(()),
			metrics: Default::default(),
		})
	}

	/// Returns the cached credential without any I/O.
	pub fn snapshot(&self) -> Option<Arc<Credential>> {
		self.slot.read().credential.clone()
	}

	/// Returns refresh counters shared with this manager.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// Reports the lifecycle state using the current UTC instant.
	pub fn state(&self) -> TokenState {
		self.state_at(OffsetDateTime::now_utc())
	}

	/// Reports the lifecycle state at `now`.
	pub fn state_at(&self, now: OffsetDateTime) -> TokenState {
		let slot = self.slot.read();

		if slot.last_issue_failed {
			return TokenState::Unrecoverable;
		}

		match slot.credential.as_deref() {
			None => TokenState::Uninitialized,
			Some(credential) if credential.is_fresh_at(now, self.refresh_margin) =>
				TokenState::Valid,
			Some(_) => TokenState::NearExpiry,
		}
	}

	/// Returns a credential that is valid for longer than the refresh margin.
	///
	/// With `force_refresh` set, a new credential is issued even when the cached one looks
	/// fresh; the executor does this after the API rejects a token.
	pub async fn ensure_valid(&self, force_refresh: bool) -> Result<Arc<Credential>> {
		if let Some(fresh) = self.reusable_snapshot(force_refresh) {
			return Ok(fresh);
		}

		let _gate = self.gate.lock().await;

		self.metrics.record_gate_entry();

		if let Some(fresh) = self.reusable_snapshot(force_refresh) {
			return Ok(fresh);
		}

		self.issue(force_refresh).await
	}

	/// Replaces `rejected` after the API refused it.
	///
	/// Callers that were all holding the same rejected credential queue on the gate; only
	/// the first one issues. The others find a different, fresh snapshot already published
	/// and reuse it, so one rejection event costs one issuing call.
	pub async fn refresh_after_rejection(
		&self,
		rejected: &Arc<Credential>,
	) -> Result<Arc<Credential>> {
		let _gate = self.gate.lock().await;

		self.metrics.record_gate_entry();

		let now = OffsetDateTime::now_utc();
		let replacement = self.snapshot().filter(|current| {
			!Arc::ptr_eq(current, rejected) && current.is_fresh_at(now, self.refresh_margin)
		});

		match replacement {
			Some(current) => Ok(current),
			None => self.issue(true).await,
		}
	}

	fn reusable_snapshot(&self, force_refresh: bool) -> Option<Arc<Credential>> {
		if force_refresh {
			return None;
		}

		let now = OffsetDateTime::now_utc();

		self.snapshot().filter(|credential| credential.is_fresh_at(now, self.refresh_margin))
	}

	// Caller must hold the gate.
	async fn issue(&self, forced: bool) -> Result<Arc<Credential>> {
		const KIND: OperationKind = OperationKind::Token;

		let span = OperationSpan::new(KIND, "issue_credential");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
		self.metrics.record_issue();

		let result = span
			.instrument(async {
				let request = wire::build_token_request(&self.endpoint, &self.key, &self.scope)?;
				let response = self
					.timeout
					.run(http::send(self.http_client.as_ref(), request))
					.await
					.map_err(|err| {
						Error::credential_unavailable("token endpoint call failed", Some(err))
					})?;

				wire::parse_token_response(&response)
			})
			.await;

		obs::record_result(KIND, &result);

		match result {
			Ok(credential) => {
				let credential = Arc::new(credential);
				let mut slot = self.slot.write();

				slot.credential = Some(credential.clone());
				slot.last_issue_failed = false;

				obs::trace_credential_issued(credential.expires_at, forced);

				Ok(credential)
			},
			Err(err) => {
				self.slot.write().last_issue_failed = true;
				self.metrics.record_failure();

				Err(match err {
					err @ Error::CredentialUnavailable { .. } => err,
					other => Error::credential_unavailable("token request failed", Some(other)),
				})
			},
		}
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("endpoint", &self.endpoint.as_str())
			.field("scope", &self.scope)
			.field("refresh_margin", &self.refresh_margin)
			.field("state", &self.state())
			.finish()
	}
}
