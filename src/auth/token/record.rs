//! Immutable token values, renewal eligibility, and builders.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Distinguishes tokens obtained through a login from opaque, pre-issued ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	/// Token minted by a login; carries lease metadata and may be renewed or revoked.
	Login,
	/// Opaque token handed in from the outside; never renewed or revoked.
	Static,
}

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuildError {
	/// Issued when the secret is empty.
	#[error("Token secret must not be empty.")]
	EmptySecret,
	/// Issued when a caller supplies a negative lease to the builder.
	#[error("Lease duration must not be negative.")]
	NegativeLease,
}

/// Credential issued by the backend plus the lease metadata that drives renewal.
///
/// Tokens are never mutated; a login always produces a new value and a successful renewal
/// keeps the existing one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	secret: TokenSecret,
	kind: TokenKind,
	lease_duration: Duration,
	renewable: bool,
	issued_at: OffsetDateTime,
}
impl Token {
	/// Returns a builder for a login token.
	pub fn login(secret: impl Into<String>) -> TokenBuilder {
		TokenBuilder::new(secret)
	}

	/// Wraps an opaque token that must never be renewed or revoked.
	pub fn from_static(secret: impl Into<String>) -> Self {
		Self {
			secret: TokenSecret::new(secret),
			kind: TokenKind::Static,
			lease_duration: Duration::ZERO,
			renewable: false,
			issued_at: OffsetDateTime::now_utc(),
		}
	}

	/// Parses a login response body shaped like `{"auth": {"client_token": ..}}`.
	pub fn from_login_response(body: &[u8]) -> Result<Self> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let response: LoginResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::MalformedResponse { source })?;
		let auth = response.auth;

		Ok(Self::login(auth.client_token)
			// A negative lease from the backend means the token is not renewable.
			.lease_duration(Duration::seconds(auth.lease_duration.max(0)))
			.renewable(auth.renewable)
			.build()?)
	}

	/// Secret value; callers must avoid logging it.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}

	/// Token kind tag.
	pub fn kind(&self) -> TokenKind {
		self.kind
	}

	/// Validity window reported by the backend.
	pub fn lease_duration(&self) -> Duration {
		self.lease_duration
	}

	/// Whether the backend allows self-renewal.
	pub fn renewable(&self) -> bool {
		self.renewable
	}

	/// Instant the token value was created locally.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Returns `true` when the token is a login token with a positive lease that the backend
	/// marked renewable.
	pub fn is_renewable(&self) -> bool {
		matches!(self.kind, TokenKind::Login) && self.lease_duration.is_positive() && self.renewable
	}

	/// Returns `true` for tokens that should be revoked on shutdown.
	pub fn is_login(&self) -> bool {
		matches!(self.kind, TokenKind::Login)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("secret", &"<redacted>")
			.field("kind", &self.kind)
			.field("lease_duration", &self.lease_duration)
			.field("renewable", &self.renewable)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

/// Builder for login [`Token`] values.
#[derive(Clone, Debug)]
pub struct TokenBuilder {
	secret: TokenSecret,
	lease_duration: Duration,
	renewable: bool,
	issued_at: Option<OffsetDateTime>,
}
impl TokenBuilder {
	fn new(secret: impl Into<String>) -> Self {
		Self {
			secret: TokenSecret::new(secret),
			lease_duration: Duration::ZERO,
			renewable: false,
			issued_at: None,
		}
	}

	/// Sets the lease reported by the backend.
	pub fn lease_duration(mut self, lease: Duration) -> Self {
		self.lease_duration = lease;

		self
	}

	/// Marks whether the backend allows self-renewal.
	pub fn renewable(mut self, renewable: bool) -> Self {
		self.renewable = renewable;

		self
	}

	/// Overrides the local creation instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuildError> {
		if self.secret.is_empty() {
			return Err(TokenBuildError::EmptySecret);
		}
		if self.lease_duration.is_negative() {
			return Err(TokenBuildError::NegativeLease);
		}

		Ok(Token {
			secret: self.secret,
			kind: TokenKind::Login,
			lease_duration: self.lease_duration,
			renewable: self.renewable,
			issued_at: self.issued_at.unwrap_or_else(OffsetDateTime::now_utc),
		})
	}
}

#[derive(Deserialize)]
struct LoginResponse {
	auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
	client_token: String,
	#[serde(default)]
	lease_duration: i64,
	#[serde(default)]
	renewable: bool,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn renewability_requires_login_kind_positive_lease_and_flag() {
		let renewable = Token::login("s.renewable")
			.lease_duration(Duration::seconds(30))
			.renewable(true)
			.build()
			.expect("Renewable token fixture should build.");

		assert!(renewable.is_renewable());

		let flagged_off = Token::login("s.fixed")
			.lease_duration(Duration::seconds(30))
			.build()
			.expect("Non-renewable token fixture should build.");

		assert!(!flagged_off.is_renewable());

		let no_lease = Token::login("s.root")
			.renewable(true)
			.build()
			.expect("Zero-lease token fixture should build.");

		assert!(!no_lease.is_renewable());
		assert!(!Token::from_static("s.static").is_renewable());
		assert!(!Token::from_static("s.static").is_login());
	}

	#[test]
	fn builder_rejects_empty_secret_and_negative_lease() {
		assert_eq!(Token::login("").build(), Err(TokenBuildError::EmptySecret));
		assert_eq!(
			Token::login("s.token").lease_duration(Duration::seconds(-1)).build(),
			Err(TokenBuildError::NegativeLease)
		);
	}

	#[test]
	fn builder_keeps_explicit_issued_at() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token::login("s.token")
			.issued_at(issued)
			.build()
			.expect("Token with explicit issued_at should build.");

		assert_eq!(token.issued_at(), issued);
		assert_eq!(token.kind(), TokenKind::Login);
	}

	#[test]
	fn login_response_maps_auth_block() {
		let body = br#"{"request_id":"r-1","auth":{"client_token":"s.approle","accessor":"a","lease_duration":2764800,"renewable":true}}"#;
		let token = Token::from_login_response(body).expect("Login response should parse.");

		assert_eq!(token.secret().expose(), "s.approle");
		assert_eq!(token.lease_duration(), Duration::seconds(2_764_800));
		assert!(token.is_renewable());
	}

	#[test]
	fn malformed_login_response_reports_field_path() {
		let body = br#"{"auth":{"client_token":42}}"#;
		let err = Token::from_login_response(body)
			.expect_err("Numeric client_token should fail to parse.");

		match err {
			Error::MalformedResponse { source } =>
				assert_eq!(source.path().to_string(), "auth.client_token"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn debug_output_redacts_secret() {
		let token = Token::from_static("s.very-secret");

		assert!(!format!("{token:?}").contains("very-secret"));
	}

	#[test]
	fn negative_lease_in_login_response_is_not_renewable() {
		let token = Token::from_login_response(
			br#"{"auth":{"client_token":"s.x","lease_duration":-1,"renewable":true}}"#,
		)
		.expect("Negative lease should still produce a login token.");

		assert!(token.is_login());
		assert_eq!(token.lease_duration(), Duration::ZERO);
		assert!(!token.is_renewable());
	}
}
