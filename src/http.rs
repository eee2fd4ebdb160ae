//! Transport primitives for token and API calls.
//!
//! [`ApiHttpClient`] is the broker's only dependency on an HTTP stack. Requests and
//! responses use the `http` crate types re-exported by `oauth2`, so an implementation only
//! has to move bytes: the token manager and executor build every header and body, and
//! they read status codes straight off the returned [`HttpResponse`]. Non-success statuses
//! must come back as `Ok(response)`; `Err` is reserved for failures where no response
//! exists at all.

// std
use std::ops::Deref;
// crates.io
pub use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{Method, Request, StatusCode, header},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports used for every outbound call.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// token manager and the executor behind an `Arc`.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error raised by the transport before any HTTP status is available.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with whatever response the server produced.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// [`ApiHttpClient`] over a shared [`ReqwestClient`], used by every broker call.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Converts a transport failure into a broker [`Error`].
pub fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other(message).into(),
		other => TransportError::Other(format!("{other}")).into(),
	}
}

/// Sends `request` through `client`, mapping transport failures into broker errors.
pub async fn send<C>(client: &C, request: HttpRequest) -> Result<HttpResponse>
where
	C: ?Sized + ApiHttpClient,
{
	client.execute(request).await.map_err(map_transport_error)
}
