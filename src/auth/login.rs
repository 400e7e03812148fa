//! Login contracts consumed by the session manager.

// self
use crate::{_prelude::*, auth::Token};

/// Boxed future returned by [`ClientAuthentication::login`].
pub type LoginFuture<'a> = Pin<Box<dyn Future<Output = Result<Token>> + 'a + Send>>;

/// Backend-specific login mechanism.
///
/// Implementations perform whatever exchange the backend requires and return a freshly issued
/// [`Token`]. Rejections must surface as [`Error::Authentication`]; the session manager never
/// retries a failed login on its own.
pub trait ClientAuthentication
where
	Self: Send + Sync,
{
	/// Obtains a new token from the backend.
	fn login(&self) -> LoginFuture<'_>;
}

/// Authentication that hands out a pre-issued, opaque token.
///
/// The token is never renewed or revoked by the session manager.
#[derive(Clone, Debug)]
pub struct TokenAuthentication {
	token: Token,
}
impl TokenAuthentication {
	/// Wraps the provided static token value.
	pub fn new(token: impl Into<String>) -> Self {
		Self { token: Token::from_static(token) }
	}
}
impl ClientAuthentication for TokenAuthentication {
	fn login(&self) -> LoginFuture<'_> {
		let token = self.token.clone();

		Box::pin(async move {
			if token.secret().is_empty() {
				return Err(Error::Authentication { reason: "static token is empty".into() });
			}

			Ok(token)
		})
	}
}
