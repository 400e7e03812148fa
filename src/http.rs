//! Reqwest-backed gateway for Vault's token self-service endpoints.
//!
//! [`HttpGateway`] implements [`SessionGateway`] against `auth/token/renew-self` and
//! `auth/token/revoke-self`, and exposes [`HttpGateway::post_login`] so login mechanisms such as
//! [`AppRoleAuthentication`](crate::auth::AppRoleAuthentication) can share the same client. The
//! gateway never follows redirects and never retries; status classes are reported as-is.

// self
use crate::{
	_prelude::*,
	auth::Token,
	error::{ConfigError, TransportError},
	gateway::{BackendFailure, GatewayFuture, RenewalOutcome, SessionGateway},
};

/// Header carrying the token on authenticated calls.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

const RENEW_SELF_PATH: &str = "auth/token/renew-self";
const REVOKE_SELF_PATH: &str = "auth/token/revoke-self";

/// HTTP gateway addressing a Vault-compatible backend under `{base}v1/`.
#[derive(Clone)]
pub struct HttpGateway {
	client: ReqwestClient,
	base: Url,
}
impl HttpGateway {
	/// Builds a gateway with its own client that does not follow redirects.
	pub fn new(base: &str) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self::with_client(client, base)?)
	}

	/// Wraps an existing client. Configure it to disable redirect following.
	pub fn with_client(client: ReqwestClient, base: &str) -> Result<Self, ConfigError> {
		let mut base = Url::parse(base).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		if base.cannot_be_a_base() {
			return Err(ConfigError::InvalidBaseUrl {
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			});
		}
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		Ok(Self { client, base })
	}

	/// Base URL every endpoint is resolved against.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Resolves an API path such as `auth/approle/login` to `{base}v1/{path}`.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base
			.join(&format!("v1/{}", path.trim_start_matches('/')))
			.map_err(|source| ConfigError::InvalidBaseUrl { source })
	}

	/// Posts a JSON login payload to `path` and parses the issued token.
	///
	/// Non-2xx responses become [`Error::Authentication`]; network failures become
	/// [`Error::Transport`].
	pub async fn post_login(&self, path: &str, payload: &serde_json::Value) -> Result<Token> {
		let uri = self.endpoint(path)?;
		let response = self
			.client
			.post(uri.clone())
			.json(payload)
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		if !status.is_success() {
			let failure = failure_from_body(status.as_u16(), uri, &body);

			return Err(Error::Authentication { reason: failure.to_string() });
		}

		Token::from_login_response(&body)
	}

	async fn post_with_token(&self, path: &str, token: &Token) -> Result<(), BackendFailure> {
		let uri = self.endpoint(path).map_err(BackendFailure::transport)?;
		let response = self
			.client
			.post(uri.clone())
			.header(TOKEN_HEADER, token.secret().expose())
			.send()
			.await
			.map_err(|e| BackendFailure::transport(e).with_uri(uri.clone()))?;
		let status = response.status();

		if status.is_success() {
			return Ok(());
		}

		let body = response.bytes().await.unwrap_or_default();

		Err(failure_from_body(status.as_u16(), uri, &body))
	}
}
impl AsRef<ReqwestClient> for HttpGateway {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
impl Debug for HttpGateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpGateway").field("base", &self.base.as_str()).finish()
	}
}
impl SessionGateway for HttpGateway {
	fn renew<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, RenewalOutcome> {
		Box::pin(async move {
			match self.post_with_token(RENEW_SELF_PATH, token).await {
				Ok(()) => RenewalOutcome::Renewed,
				Err(failure) => match failure.status {
					Some(status) => RenewalOutcome::from_status(status, failure),
					None => RenewalOutcome::ServerError(failure),
				},
			}
		})
	}

	fn revoke<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, Result<(), BackendFailure>> {
		Box::pin(async move { self.post_with_token(REVOKE_SELF_PATH, token).await })
	}
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	errors: Vec<String>,
}

fn failure_from_body(status: u16, uri: Url, body: &[u8]) -> BackendFailure {
	let message = match serde_json::from_slice::<ErrorBody>(body) {
		Ok(parsed) => parsed.errors.join("; "),
		Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
	};

	BackendFailure::new(Some(status)).with_uri(uri).with_message(message)
}
