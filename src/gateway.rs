//! Backend gateway contract for token renewal and revocation.
//!
//! The session manager only needs two calls from the backend and a way to tell a rejected
//! credential apart from a backend that is temporarily unhealthy. [`RenewalOutcome`] carries that
//! classification explicitly so no control flow depends on error types.

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by [`SessionGateway`] calls.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Narrow interface to the backend's token self-service endpoints.
///
/// Implementations must not retry on their own; retry policy belongs to the transport layer.
pub trait SessionGateway
where
	Self: Send + Sync,
{
	/// Asks the backend to extend the lease of `token`.
	fn renew<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, RenewalOutcome>;

	/// Asks the backend to invalidate `token`. Best-effort; callers log failures.
	fn revoke<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, Result<(), BackendFailure>>;
}

/// Classified result of a renewal call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalOutcome {
	/// Lease extended; the token stays valid.
	Renewed,
	/// Backend answered with a client-side (4xx) status: the token is expired, unknown, or no
	/// longer permitted.
	ClientRejected(BackendFailure),
	/// Server-side status or transport failure; assumed transient.
	ServerError(BackendFailure),
}
impl RenewalOutcome {
	/// Classifies an HTTP status: 2xx renews, 4xx rejects, everything else is a server error.
	pub fn from_status(status: u16, failure: BackendFailure) -> Self {
		match status {
			200..=299 => Self::Renewed,
			400..=499 => Self::ClientRejected(failure),
			_ => Self::ServerError(failure),
		}
	}
}

/// Details of a failed backend call.
///
/// Renders as `Status {status} URI {uri}: {message}`, omitting parts that are unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendFailure {
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Endpoint that was called.
	pub uri: Option<Url>,
	/// Backend- or transport-supplied message.
	pub message: Option<String>,
}
impl BackendFailure {
	/// Creates a failure for the provided status.
	pub fn new(status: Option<u16>) -> Self {
		Self { status, uri: None, message: None }
	}

	/// Convenience constructor for transport failures that never produced a status.
	pub fn transport(message: impl Display) -> Self {
		Self::new(None).with_message(message.to_string())
	}

	/// Attaches the endpoint URI.
	pub fn with_uri(mut self, uri: Url) -> Self {
		self.uri = Some(uri);

		self
	}

	/// Attaches a message; blank messages are dropped.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		let message = message.into();

		self.message = if message.trim().is_empty() { None } else { Some(message) };

		self
	}
}
impl Display for BackendFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.status {
			Some(status) => write!(f, "Status {status}")?,
			None => f.write_str("Status unknown")?,
		}
		if let Some(uri) = &self.uri {
			write!(f, " URI {uri}")?;
		}
		if let Some(message) = &self.message {
			write!(f, ": {message}")?;
		}

		Ok(())
	}
}
impl StdError for BackendFailure {}
