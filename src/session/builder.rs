// self
use crate::{
	_prelude::*,
	auth::ClientAuthentication,
	error::ConfigError,
	gateway::SessionGateway,
	scheduler::TaskExecutor,
	session::SessionManager,
};

/// Tunables for a [`SessionManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	/// Safety window subtracted from the lease before the next renewal.
	pub refresh_margin: Duration,
}
impl SessionConfig {
	/// Default refresh margin.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(5);

	/// Overrides the refresh margin.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = margin;

		self
	}

	/// Checks the tunables.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.refresh_margin.is_negative() {
			return Err(ConfigError::NegativeRefreshMargin);
		}

		Ok(())
	}
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self { refresh_margin: Self::DEFAULT_REFRESH_MARGIN }
	}
}

/// Builder for [`SessionManager`] values.
#[derive(Default)]
pub struct SessionManagerBuilder {
	authentication: Option<Arc<dyn ClientAuthentication>>,
	executor: Option<Arc<dyn TaskExecutor>>,
	gateway: Option<Arc<dyn SessionGateway>>,
	config: SessionConfig,
}
impl SessionManagerBuilder {
	/// Sets the login mechanism.
	pub fn authentication(mut self, authentication: Arc<dyn ClientAuthentication>) -> Self {
		self.authentication = Some(authentication);

		self
	}

	/// Sets the executor that runs background renewal.
	pub fn executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
		self.executor = Some(executor);

		self
	}

	/// Sets the backend gateway used for renewal and revocation.
	pub fn gateway(mut self, gateway: Arc<dyn SessionGateway>) -> Self {
		self.gateway = Some(gateway);

		self
	}

	/// Overrides the refresh margin (defaults to 5 seconds).
	pub fn refresh_margin(mut self, margin: Duration) -> Self {
		self.config = self.config.with_refresh_margin(margin);

		self
	}

	/// Replaces every tunable at once.
	pub fn config(mut self, config: SessionConfig) -> Self {
		self.config = config;

		self
	}

	/// Validates the collaborators and produces a [`SessionManager`].
	pub fn build(self) -> Result<SessionManager, ConfigError> {
		let authentication = self
			.authentication
			.ok_or(ConfigError::MissingComponent { component: "client authentication" })?;
		let executor =
			self.executor.ok_or(ConfigError::MissingComponent { component: "task executor" })?;
		let gateway =
			self.gateway.ok_or(ConfigError::MissingComponent { component: "gateway" })?;

		self.config.validate()?;

		Ok(SessionManager::from_parts(authentication, executor, gateway, self.config))
	}
}
impl Debug for SessionManagerBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManagerBuilder")
			.field("authentication_set", &self.authentication.is_some())
			.field("executor_set", &self.executor.is_some())
			.field("gateway_set", &self.gateway.is_some())
			.field("config", &self.config)
			.finish()
	}
}
