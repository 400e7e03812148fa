//! Session-level error types shared across login, renewal, and gateway adapters.

// self
use crate::{_prelude::*, auth::TokenBuildError, gateway::BackendFailure};

/// Session-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) on the login path.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token value could not be assembled.
	#[error(transparent)]
	Token(#[from] TokenBuildError),

	/// Login backend rejected the credentials.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Backend- or adapter-supplied reason string.
		reason: String,
	},
	/// Renewal hit a server-side or transport failure; the cached token is kept.
	#[error("Token renewal failed: {0}.")]
	Renewal(BackendFailure),
	/// Login endpoint responded with a body that could not be parsed.
	#[error("Login endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure including the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised while assembling a session.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A mandatory collaborator was not supplied to the builder.
	#[error("Session manager requires a {component}.")]
	MissingComponent {
		/// Name of the missing collaborator.
		component: &'static str,
	},
	/// Refresh margin must not be negative.
	#[error("Refresh margin must not be negative.")]
	NegativeRefreshMargin,
	/// Executor construction needs a running tokio runtime.
	#[error("No tokio runtime is available to drive background renewal.")]
	NoRuntime,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Backend base URL cannot be used to address endpoints.
	#[error("Backend base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures on the login path.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
