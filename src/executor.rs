//! Authorized request execution with a bounded retry on rejected credentials.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	deadline::Deadline,
	http::{self, ApiHttpClient, HttpRequest, HttpResponse},
	obs::{self, OperationKind},
	provider::{ProviderStrategy, ResponseClass, ResponseContext},
	token::TokenManager,
};

/// Per-operation attempt counter.
///
/// `allowed` is the retry ceiling plus the initial attempt, and `attempts` never exceeds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
	attempts: u32,
	allowed: u32,
}
impl RetryBudget {
	/// Creates a budget allowing `max_retries` forced refreshes after the first attempt.
	pub fn new(max_retries: u32) -> Self {
		Self { attempts: 0, allowed: max_retries.saturating_add(1) }
	}

	/// Consumes one attempt, returning `false` when none were left.
	pub fn record_attempt(&mut self) -> bool {
		if self.attempts >= self.allowed {
			return false;
		}

		self.attempts += 1;

		true
	}

	/// Returns `true` while another attempt may be sent.
	pub fn can_retry(&self) -> bool {
		self.attempts < self.allowed
	}

	/// Attempts sent so far.
	pub fn attempts(&self) -> u32 {
		self.attempts
	}

	/// Total attempts permitted.
	pub fn allowed(&self) -> u32 {
		self.allowed
	}
}

/// Sends bearer-authorized requests, refreshing and retrying when the API rejects the token.
pub struct AuthorizedExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	tokens: Arc<TokenManager<C>>,
	strategy: Arc<dyn ProviderStrategy>,
	max_auth_retries: u32,
}
impl<C> AuthorizedExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates an executor sharing `tokens` and `http_client` with the caller.
	pub fn new(
		http_client: Arc<C>,
		tokens: Arc<TokenManager<C>>,
		strategy: Arc<dyn ProviderStrategy>,
		max_auth_retries: u32,
	) -> Self {
		Self { http_client, tokens, strategy, max_auth_retries }
	}

	/// Token manager backing this executor.
	pub fn tokens(&self) -> &Arc<TokenManager<C>> {
		&self.tokens
	}

	/// Runs one logical operation.
	///
	/// `build` is called once per attempt with the credential to authorize it, and each send
	/// runs under `deadline`. A response classified as
	/// [`ResponseClass::Unauthorized`] replaces the rejected credential through
	/// [`TokenManager::refresh_after_rejection`] and retries until the budget is spent, which
	/// yields [`Error::AuthExhausted`]. Other non-success responses fail with
	/// [`Error::RequestFailed`]. Timeouts and decoding failures are returned as-is.
	pub async fn execute<T, B, D>(
		&self,
		kind: OperationKind,
		deadline: Deadline,
		mut build: B,
		decode: D,
	) -> Result<T>
	where
		B: FnMut(&Credential) -> Result<HttpRequest>,
		D: FnOnce(HttpResponse) -> Result<T>,
	{
		let mut budget = RetryBudget::new(self.max_auth_retries);
		let mut credential = self.tokens.ensure_valid(false).await?;

		loop {
			let request = build(&credential)?;

			budget.record_attempt();

			let response =
				deadline.run(http::send(self.http_client.as_ref(), request)).await?;
			let ctx = ResponseContext::new(kind, response.status().as_u16(), response.body());

			match self.strategy.classify_response(&ctx) {
				ResponseClass::Success => return decode(response),
				ResponseClass::Unauthorized => {
					obs::trace_credential_rejected(kind, budget.attempts(), budget.allowed());

					if !budget.can_retry() {
						return Err(Error::AuthExhausted {
							attempts: budget.attempts(),
							detail: ctx.body_preview,
						});
					}

					obs::record_auth_retry(kind);

					credential = self.tokens.refresh_after_rejection(&credential).await?;
				},
				ResponseClass::Failure =>
					return Err(Error::RequestFailed {
						status: ctx.http_status,
						detail: ctx.body_preview,
					}),
			}
		}
	}
}
impl<C> Debug for AuthorizedExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedExecutor")
			.field("tokens", &self.tokens)
			.field("max_auth_retries", &self.max_auth_retries)
			.finish_non_exhaustive()
	}
}
