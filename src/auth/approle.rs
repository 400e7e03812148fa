//! AppRole login over the HTTP gateway.

// self
use crate::{
	_prelude::*,
	auth::{ClientAuthentication, LoginFuture},
	http::HttpGateway,
};

/// Logs in with a role ID and secret ID against `auth/{mount}/login`.
#[derive(Clone)]
pub struct AppRoleAuthentication {
	gateway: Arc<HttpGateway>,
	role_id: String,
	secret_id: String,
	mount: String,
}
impl AppRoleAuthentication {
	const DEFAULT_MOUNT: &str = "approle";

	/// Creates an AppRole login using the default `approle` mount.
	pub fn new(
		gateway: Arc<HttpGateway>,
		role_id: impl Into<String>,
		secret_id: impl Into<String>,
	) -> Self {
		Self {
			gateway,
			role_id: role_id.into(),
			secret_id: secret_id.into(),
			mount: Self::DEFAULT_MOUNT.into(),
		}
	}

	/// Overrides the auth mount path.
	pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
		self.mount = mount.into().trim_matches('/').to_owned();

		self
	}

	fn login_path(&self) -> String {
		format!("auth/{}/login", self.mount)
	}
}
impl Debug for AppRoleAuthentication {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppRoleAuthentication")
			.field("gateway", &self.gateway)
			.field("role_id", &self.role_id)
			.field("secret_id", &"<redacted>")
			.field("mount", &self.mount)
			.finish()
	}
}
impl ClientAuthentication for AppRoleAuthentication {
	fn login(&self) -> LoginFuture<'_> {
		Box::pin(async move {
			let payload = serde_json::json!({
				"role_id": self.role_id,
				"secret_id": self.secret_id,
			});

			self.gateway.post_login(&self.login_path(), &payload).await
		})
	}
}
