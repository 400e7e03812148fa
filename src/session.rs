//! Lifecycle-aware session management with lazy login and background self-renewal.
//!
//! [`SessionManager::get_session_token`] logs in on first use and caches the token. When the
//! backend reports a positive lease and marks the token renewable, a renewal cycle is armed on
//! the configured [`TaskExecutor`]: `max(1s, lease - margin)` later the token renews itself, and
//! every successful renewal keeps the cycle going. A 4xx-class rejection clears the cache so the
//! next access logs in again; server or transport failures leave the token in place.
//!
//! Reads take a snapshot of the cached `Arc<Token>`. Every transition (login, clearing after a
//! rejection, revocation) is serialized on one async mutex shared by the foreground and the
//! background paths. Renewal cycles hold only weak references and end on their own once the
//! token they were armed for is gone, replaced, or the manager is dropped.

mod builder;
mod metrics;

pub use builder::*;
pub use metrics::SessionMetrics;

// std
use std::ops::ControlFlow;
// self
use crate::{
	_prelude::*,
	auth::{ClientAuthentication, Token},
	gateway::{RenewalOutcome, SessionGateway},
	obs::{self, OpOutcome, OpSpan, SessionOp},
	scheduler::{self, RecurringTask, TaskExecutor, TickFuture},
};

/// Caches one session token and keeps it alive until [`SessionManager::destroy`].
///
/// Cloning is cheap and every clone shares the same cached token.
#[derive(Clone)]
pub struct SessionManager {
	state: Arc<SessionState>,
}
impl SessionManager {
	/// Returns a builder that validates every collaborator.
	pub fn builder() -> SessionManagerBuilder {
		SessionManagerBuilder::default()
	}

	/// Creates a manager with the default refresh margin.
	pub fn new(
		authentication: Arc<dyn ClientAuthentication>,
		executor: Arc<dyn TaskExecutor>,
		gateway: Arc<dyn SessionGateway>,
	) -> Self {
		Self::from_parts(authentication, executor, gateway, SessionConfig::default())
	}

	pub(crate) fn from_parts(
		authentication: Arc<dyn ClientAuthentication>,
		executor: Arc<dyn TaskExecutor>,
		gateway: Arc<dyn SessionGateway>,
		config: SessionConfig,
	) -> Self {
		Self {
			state: Arc::new(SessionState {
				authentication,
				executor,
				gateway,
				config,
				token: RwLock::new(None),
				transition: AsyncMutex::new(()),
				metrics: SessionMetrics::default(),
			}),
		}
	}

	/// Returns the cached token, logging in first when none is cached.
	///
	/// Concurrent callers starting from an empty cache share a single login. Login failures are
	/// returned unchanged and nothing is cached.
	pub async fn get_session_token(&self) -> Result<Arc<Token>> {
		self.state.session_token().await
	}

	/// Renews the cached token through the gateway.
	///
	/// Returns `Ok(true)` when the backend extended the lease. Returns `Ok(false)` when no token
	/// was cached (a fresh login is performed instead) or when the backend rejected the token (the
	/// cache is cleared so the next access logs in again). Server and transport failures are
	/// returned as [`Error::Renewal`] and leave the cached token untouched.
	pub async fn renew_token(&self) -> Result<bool> {
		self.state.renew_token().await
	}

	/// Returns `true` when the cached token takes part in renewal.
	pub fn is_token_renewable(&self) -> bool {
		self.state.current().is_some_and(|token| token.is_renewable())
	}

	/// Snapshot of the cached token without logging in.
	pub fn cached_token(&self) -> Option<Arc<Token>> {
		self.state.current()
	}

	/// Clears the cache and revokes the token when it came from a login.
	///
	/// Revocation failures are logged, never returned. Pending renewal cycles stop at their next
	/// fire.
	pub async fn destroy(&self) {
		self.state.destroy().await
	}

	/// Lifecycle counters for this manager.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.state.metrics
	}

	/// Safety window subtracted from the lease before each renewal.
	pub fn refresh_margin(&self) -> Duration {
		self.state.config.refresh_margin
	}
}
impl Debug for SessionManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("token", &self.state.current())
			.field("config", &self.state.config)
			.finish()
	}
}

struct SessionState {
	authentication: Arc<dyn ClientAuthentication>,
	executor: Arc<dyn TaskExecutor>,
	gateway: Arc<dyn SessionGateway>,
	config: SessionConfig,
	token: RwLock<Option<Arc<Token>>>,
	transition: AsyncMutex<()>,
	metrics: SessionMetrics,
}
impl SessionState {
	fn current(&self) -> Option<Arc<Token>> {
		self.token.read().clone()
	}

	fn store(&self, token: Arc<Token>) {
		*self.token.write() = Some(token);
	}

	fn take(&self) -> Option<Arc<Token>> {
		self.token.write().take()
	}

	fn clear_if_current(&self, token: &Arc<Token>) -> bool {
		let mut slot = self.token.write();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, token)) {
			*slot = None;

			return true;
		}

		false
	}

	async fn session_token(self: &Arc<Self>) -> Result<Arc<Token>> {
		if let Some(token) = self.current() {
			return Ok(token);
		}

		let _transition = self.transition.lock().await;

		if let Some(token) = self.current() {
			return Ok(token);
		}

		let token = Arc::new(self.login().await?);

		self.store(token.clone());

		if token.is_renewable() {
			self.schedule_refresh(&token);
		}

		Ok(token)
	}

	async fn login(&self) -> Result<Token> {
		const OP: SessionOp = SessionOp::Login;

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = OpSpan::new(OP, "session_token").instrument(self.authentication.login()).await;

		self.metrics.record_login(result.is_ok());

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	async fn renew_token(self: &Arc<Self>) -> Result<bool> {
		let transition = self.transition.lock().await;
		let Some(token) = self.current() else {
			drop(transition);

			self.session_token().await?;

			return Ok(false);
		};

		self.renew_locked(&token).await
	}

	/// Renews `token`; the caller must hold the transition lock.
	async fn renew_locked(&self, token: &Arc<Token>) -> Result<bool> {
		const OP: SessionOp = SessionOp::Renew;

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let outcome = OpSpan::new(OP, "renew_token").instrument(self.gateway.renew(token)).await;

		match outcome {
			RenewalOutcome::Renewed => {
				self.metrics.record_renewal();
				obs::record_op_outcome(OP, OpOutcome::Success);

				Ok(true)
			},
			RenewalOutcome::ClientRejected(failure) => {
				obs::renewal_rejected(&failure);
				self.metrics.record_rejection();
				obs::record_op_outcome(OP, OpOutcome::Rejected);
				self.clear_if_current(token);

				Ok(false)
			},
			RenewalOutcome::ServerError(failure) => {
				self.metrics.record_renewal_failure();
				obs::record_op_outcome(OP, OpOutcome::Failure);

				Err(Error::Renewal(failure))
			},
		}
	}

	async fn destroy(&self) {
		const OP: SessionOp = SessionOp::Revoke;

		let _transition = self.transition.lock().await;
		let Some(token) = self.take() else {
			return;
		};

		if !token.is_login() {
			return;
		}

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		match OpSpan::new(OP, "destroy").instrument(self.gateway.revoke(&token)).await {
			Ok(()) => {
				self.metrics.record_revocation(true);
				obs::record_op_outcome(OP, OpOutcome::Success);
			},
			Err(failure) => {
				obs::revoke_failed(&failure);
				self.metrics.record_revocation(false);
				obs::record_op_outcome(OP, OpOutcome::Failure);
			},
		}
	}

	/// Arms exactly one renewal cycle for `token`.
	fn schedule_refresh(self: &Arc<Self>, token: &Arc<Token>) {
		let delay = scheduler::refresh_delay(token.lease_duration(), self.config.refresh_margin);
		let session = Arc::downgrade(self);
		let armed = Arc::downgrade(token);

		match self.executor.as_scheduler() {
			// The primitive re-runs the task itself; the task only decides whether to go on.
			Some(fixed) => {
				obs::refresh_scheduled(delay, "fixed_delay");

				let task: RecurringTask = Arc::new(move || -> TickFuture {
					let session = session.clone();
					let armed = armed.clone();

					Box::pin(async move {
						let Some(state) = session.upgrade() else {
							return ControlFlow::Break(());
						};

						match state.renew_armed(&armed).await {
							Tick::Renewed | Tick::Failed => ControlFlow::Continue(()),
							Tick::Stopped | Tick::Abandoned => ControlFlow::Break(()),
						}
					})
				});

				fixed.schedule_with_fixed_delay(scheduler::to_std(delay), task);
			},
			None => {
				obs::refresh_scheduled(delay, "one_shot");

				let task = Box::pin(async move {
					let Some(state) = session.upgrade() else {
						return;
					};

					if matches!(state.renew_armed(&armed).await, Tick::Renewed)
						&& let Some(token) = armed.upgrade()
					{
						state.schedule_refresh(&token);
					}
				});

				self.executor.execute(scheduler::delayed(scheduler::to_std(delay), task));
			},
		}
	}

	/// One background renewal of the token the cycle was armed for.
	///
	/// The armed token is checked under the transition lock, so a tick queued behind `destroy` or
	/// a re-login ends the cycle instead of renewing (or logging in) on its own.
	async fn renew_armed(&self, armed: &Weak<Token>) -> Tick {
		let _transition = self.transition.lock().await;
		let Some(current) = self.current() else {
			obs::cycle_abandoned("token_cleared");

			return Tick::Abandoned;
		};

		if !armed.upgrade().is_some_and(|armed| Arc::ptr_eq(&armed, &current)) {
			obs::cycle_abandoned("token_replaced");

			return Tick::Abandoned;
		}
		if !current.is_renewable() {
			obs::cycle_abandoned("not_renewable");

			return Tick::Abandoned;
		}

		match self.renew_locked(&current).await {
			Ok(true) => Tick::Renewed,
			Ok(false) => {
				obs::cycle_abandoned("token_rejected");

				Tick::Stopped
			},
			Err(e) => {
				obs::refresh_failed(&e);

				Tick::Failed
			},
		}
	}
}

#[derive(Debug, PartialEq, Eq)]
enum Tick {
	Renewed,
	Stopped,
	Failed,
	Abandoned,
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::TokenAuthentication,
		gateway::BackendFailure,
		scheduler::{TokioExecutor, TokioScheduler},
	};

	fn manager(
		auth: Arc<dyn ClientAuthentication>,
		gateway: Arc<ScriptedGateway>,
		fixed_delay: bool,
	) -> SessionManager {
		let executor: Arc<dyn TaskExecutor> = if fixed_delay {
			Arc::new(TokioScheduler::try_current().expect("Runtime should be available."))
		} else {
			Arc::new(TokioExecutor::try_current().expect("Runtime should be available."))
		};

		SessionManager::new(auth, executor, gateway)
	}

	fn rejected() -> RenewalOutcome {
		RenewalOutcome::ClientRejected(BackendFailure::new(Some(403)).with_message("permission denied"))
	}

	fn server_error() -> RenewalOutcome {
		RenewalOutcome::ServerError(BackendFailure::new(Some(500)).with_message("sealed"))
	}

	async fn advance_to(start: tokio::time::Instant, millis: u64) {
		tokio::time::sleep_until(start + StdDuration::from_millis(millis)).await;
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_first_access_logs_in_once() {
		let auth = Arc::new(
			CountingAuthentication::renewable(Duration::seconds(30))
				.with_latency(StdDuration::from_millis(50)),
		);
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth.clone(), gateway, false);
		let mut handles = Vec::new();

		for _ in 0..16 {
			let manager = manager.clone();

			handles.push(tokio::spawn(async move { manager.get_session_token().await }));
		}

		let mut tokens = Vec::new();

		for handle in handles {
			tokens.push(
				handle
					.await
					.expect("Session task should not panic.")
					.expect("Session token should be issued."),
			);
		}

		assert_eq!(auth.logins(), 1);
		assert!(tokens.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
	}

	#[tokio::test(start_paused = true)]
	async fn renewal_keeps_token_identity() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth.clone(), gateway.clone(), false);
		let before = manager.get_session_token().await.expect("Login should succeed.");

		assert!(manager.renew_token().await.expect("Renewal should succeed."));

		let after = manager.get_session_token().await.expect("Cached token should be returned.");

		assert!(Arc::ptr_eq(&before, &after));
		assert_eq!(auth.logins(), 1);
		assert_eq!(gateway.renewed(), vec!["token-1".to_owned()]);
		assert_eq!(manager.metrics().renewals(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn rejected_renewal_forces_single_relogin() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::with_script([rejected()]));
		let manager = manager(auth.clone(), gateway, false);
		let first = manager.get_session_token().await.expect("Login should succeed.");

		assert!(!manager.renew_token().await.expect("Rejection is not an error."));
		assert!(manager.cached_token().is_none());
		assert!(!manager.is_token_renewable());

		let second = manager.get_session_token().await.expect("Re-login should succeed.");

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(second.secret().expose(), "token-2");
		assert_eq!(auth.logins(), 2);
		assert_eq!(manager.metrics().rejections(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn server_error_keeps_cached_token() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::with_script([server_error()]));
		let manager = manager(auth.clone(), gateway, false);
		let before = manager.get_session_token().await.expect("Login should succeed.");
		let err = manager.renew_token().await.expect_err("Server errors should surface.");

		assert!(matches!(err, Error::Renewal(BackendFailure { status: Some(500), .. })));

		let after = manager.get_session_token().await.expect("Cached token should be returned.");

		assert!(Arc::ptr_eq(&before, &after));
		assert_eq!(auth.logins(), 1);
		assert_eq!(manager.metrics().renewal_failures(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn renew_without_token_logs_in_instead() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth.clone(), gateway.clone(), false);

		assert!(!manager.renew_token().await.expect("Fallback login should succeed."));
		assert_eq!(auth.logins(), 1);
		assert!(manager.cached_token().is_some());
		assert!(gateway.renewed().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn login_failure_propagates_and_caches_nothing() {
		let auth = Arc::new(CountingAuthentication::failing());
		let manager = manager(auth.clone(), Arc::new(ScriptedGateway::default()), false);
		let err = manager.get_session_token().await.expect_err("Login should fail.");

		assert!(matches!(err, Error::Authentication { .. }));
		assert!(manager.cached_token().is_none());

		let _ = manager.get_session_token().await;

		assert_eq!(auth.logins(), 2);
		assert_eq!(manager.metrics().login_failures(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn non_renewable_tokens_never_schedule() {
		for fixed_delay in [false, true] {
			let candidates: [Arc<dyn ClientAuthentication>; 3] = [
				Arc::new(CountingAuthentication::non_renewable(Duration::seconds(30))),
				Arc::new(CountingAuthentication::renewable(Duration::ZERO)),
				Arc::new(TokenAuthentication::new("s.static")),
			];

			for auth in candidates {
				let gateway = Arc::new(ScriptedGateway::default());
				let manager = manager(auth, gateway.clone(), fixed_delay);

				manager.get_session_token().await.expect("Login should succeed.");

				assert!(!manager.is_token_renewable());

				tokio::time::sleep(StdDuration::from_secs(120)).await;

				assert!(gateway.renewed().is_empty());
			}
		}
	}

	#[tokio::test(start_paused = true)]
	async fn one_shot_cycle_renews_until_rejected() {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::with_script([
			RenewalOutcome::Renewed,
			RenewalOutcome::Renewed,
			RenewalOutcome::Renewed,
			rejected(),
		]));
		let manager = manager(auth.clone(), gateway.clone(), false);

		manager.get_session_token().await.expect("Login should succeed.");

		advance_to(start, 4_900).await;
		assert_eq!(gateway.renewed().len(), 0);

		advance_to(start, 5_100).await;
		assert_eq!(gateway.renewed().len(), 1);

		advance_to(start, 10_100).await;
		assert_eq!(gateway.renewed().len(), 2);

		advance_to(start, 15_100).await;
		assert_eq!(gateway.renewed().len(), 3);
		assert!(manager.cached_token().is_some());

		advance_to(start, 20_100).await;
		assert_eq!(gateway.renewed().len(), 4);
		assert!(manager.cached_token().is_none());

		advance_to(start, 80_000).await;
		assert_eq!(gateway.renewed().len(), 4);

		let token = manager.get_session_token().await.expect("Re-login should succeed.");

		assert_eq!(token.secret().expose(), "token-2");
		assert_eq!(auth.logins(), 2);

		advance_to(start, 85_100).await;
		assert_eq!(gateway.renewed().last().map(String::as_str), Some("token-2"));
		assert_eq!(gateway.renewed().len(), 5);
	}

	#[tokio::test(start_paused = true)]
	async fn fixed_delay_cycle_renews_until_rejected() {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::with_script([
			RenewalOutcome::Renewed,
			RenewalOutcome::Renewed,
			rejected(),
		]));
		let manager = manager(auth.clone(), gateway.clone(), true);

		manager.get_session_token().await.expect("Login should succeed.");

		advance_to(start, 5_100).await;
		assert_eq!(gateway.renewed().len(), 1);

		advance_to(start, 10_100).await;
		assert_eq!(gateway.renewed().len(), 2);

		advance_to(start, 15_100).await;
		assert_eq!(gateway.renewed().len(), 3);
		assert!(manager.cached_token().is_none());

		advance_to(start, 80_000).await;
		assert_eq!(gateway.renewed().len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn relogin_arms_exactly_one_new_cycle() {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::with_script([rejected()]));
		let manager = manager(auth.clone(), gateway.clone(), true);

		manager.get_session_token().await.expect("Login should succeed.");

		advance_to(start, 5_100).await;
		assert!(manager.cached_token().is_none());

		manager.get_session_token().await.expect("Re-login should succeed.");

		advance_to(start, 10_200).await;
		assert_eq!(gateway.renewed().len(), 2);

		advance_to(start, 15_200).await;
		assert_eq!(gateway.renewed().len(), 3);
		assert_eq!(auth.logins(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn one_shot_cycle_stops_after_server_error() {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::with_script([server_error()]));
		let manager = manager(auth.clone(), gateway.clone(), false);
		let token = manager.get_session_token().await.expect("Login should succeed.");

		advance_to(start, 5_100).await;
		assert_eq!(gateway.renewed().len(), 1);

		advance_to(start, 60_000).await;
		assert_eq!(gateway.renewed().len(), 1);

		let cached = manager.cached_token().expect("Token should stay cached.");

		assert!(Arc::ptr_eq(&token, &cached));
		assert_eq!(manager.metrics().renewal_failures(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn fixed_delay_cycle_keeps_firing_after_server_error() {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::with_script([server_error(), server_error()]));
		let manager = manager(auth.clone(), gateway.clone(), true);

		manager.get_session_token().await.expect("Login should succeed.");

		advance_to(start, 15_100).await;
		assert_eq!(gateway.renewed().len(), 3);
		assert_eq!(manager.metrics().renewal_failures(), 2);
		assert_eq!(manager.metrics().renewals(), 1);
		assert_eq!(auth.logins(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn destroy_revokes_once_and_clears_state() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth, gateway.clone(), true);

		manager.get_session_token().await.expect("Login should succeed.");
		manager.destroy().await;

		assert_eq!(gateway.revoked(), vec!["token-1".to_owned()]);
		assert!(manager.cached_token().is_none());
		assert!(!manager.is_token_renewable());

		manager.destroy().await;

		assert_eq!(gateway.revoked().len(), 1);

		tokio::time::sleep(StdDuration::from_secs(120)).await;

		assert!(gateway.renewed().is_empty());
		assert_eq!(manager.metrics().revocations(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn destroy_without_login_token_skips_the_backend() {
		let gateway = Arc::new(ScriptedGateway::default());
		let empty = manager(
			Arc::new(CountingAuthentication::renewable(Duration::seconds(30))),
			gateway.clone(),
			false,
		);

		empty.destroy().await;

		let fixed = manager(Arc::new(TokenAuthentication::new("s.static")), gateway.clone(), false);

		fixed.get_session_token().await.expect("Static login should succeed.");
		fixed.destroy().await;

		assert!(gateway.revoked().is_empty());
		assert!(fixed.cached_token().is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn revoke_failure_is_logged_not_raised() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(
			ScriptedGateway::default().failing_revoke(BackendFailure::new(Some(503))),
		);
		let manager = manager(auth, gateway.clone(), false);

		manager.get_session_token().await.expect("Login should succeed.");
		manager.destroy().await;

		assert_eq!(gateway.revoked().len(), 1);
		assert!(manager.cached_token().is_none());
		assert_eq!(manager.metrics().revocation_failures(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn dropping_the_manager_ends_the_cycle() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth, gateway.clone(), false);

		manager.get_session_token().await.expect("Login should succeed.");

		drop(manager);

		tokio::time::sleep(StdDuration::from_secs(60)).await;

		assert!(gateway.renewed().is_empty());
	}

	async fn run_destroy_behind_pending_tick(fixed_delay: bool) {
		let start = tokio::time::Instant::now();
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(10)));
		let gateway = Arc::new(
			ScriptedGateway::default()
				.with_latency(StdDuration::from_secs(4), StdDuration::from_secs(3)),
		);
		let manager = manager(auth.clone(), gateway.clone(), fixed_delay);

		manager.get_session_token().await.expect("Login should succeed.");

		// Manual renewal holds the transition lock from 4s to 8s; destroy and the 5s tick queue
		// behind it.
		advance_to(start, 4_000).await;

		let renewing = tokio::spawn({
			let manager = manager.clone();

			async move { manager.renew_token().await }
		});

		advance_to(start, 4_500).await;

		let destroying = tokio::spawn({
			let manager = manager.clone();

			async move { manager.destroy().await }
		});

		renewing.await.expect("Renewal task should not panic.").expect("Renewal should succeed.");
		destroying.await.expect("Destroy task should not panic.");
		advance_to(start, 60_000).await;

		assert_eq!(auth.logins(), 1);
		assert!(manager.cached_token().is_none());
		assert_eq!(gateway.revoked(), vec!["token-1".to_owned()]);
		assert!(gateway.renewed().iter().all(|secret| secret == "token-1"));
	}

	#[tokio::test(start_paused = true)]
	async fn one_shot_tick_queued_behind_destroy_never_logs_in() {
		run_destroy_behind_pending_tick(false).await;
	}

	#[tokio::test(start_paused = true)]
	async fn fixed_delay_tick_queued_behind_destroy_never_logs_in() {
		run_destroy_behind_pending_tick(true).await;
	}

	#[tokio::test(start_paused = true)]
	async fn armed_renewal_after_destroy_is_abandoned() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::default());
		let manager = manager(auth.clone(), gateway.clone(), false);
		let token = manager.get_session_token().await.expect("Login should succeed.");

		manager.destroy().await;

		assert_eq!(manager.state.renew_armed(&Arc::downgrade(&token)).await, Tick::Abandoned);
		assert_eq!(auth.logins(), 1);
		assert!(manager.cached_token().is_none());
		assert!(gateway.renewed().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn armed_renewal_skips_a_replacement_token() {
		let auth = Arc::new(CountingAuthentication::renewable(Duration::seconds(30)));
		let gateway = Arc::new(ScriptedGateway::with_script([rejected()]));
		let manager = manager(auth.clone(), gateway.clone(), false);
		let first = manager.get_session_token().await.expect("Login should succeed.");

		assert!(!manager.renew_token().await.expect("Rejection is not an error."));

		let second = manager.get_session_token().await.expect("Re-login should succeed.");

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(manager.state.renew_armed(&Arc::downgrade(&first)).await, Tick::Abandoned);
		assert_eq!(gateway.renewed(), vec!["token-1".to_owned()]);
		assert_eq!(manager.state.renew_armed(&Arc::downgrade(&second)).await, Tick::Renewed);
		assert_eq!(gateway.renewed(), vec!["token-1".to_owned(), "token-2".to_owned()]);
	}

	#[tokio::test(start_paused = true)]
	async fn negative_lease_login_is_cached_without_a_cycle() {
		struct ResponseAuthentication(&'static [u8]);
		impl ClientAuthentication for ResponseAuthentication {
			fn login(&self) -> crate::auth::LoginFuture<'_> {
				Box::pin(async move { Token::from_login_response(self.0) })
			}
		}

		for fixed_delay in [false, true] {
			let gateway = Arc::new(ScriptedGateway::default());
			let manager = manager(
				Arc::new(ResponseAuthentication(
					br#"{"auth":{"client_token":"s.expired","lease_duration":-1,"renewable":true}}"#,
				)),
				gateway.clone(),
				fixed_delay,
			);
			let token = manager.get_session_token().await.expect("Login should succeed.");

			assert!(token.is_login());
			assert!(!manager.is_token_renewable());

			tokio::time::sleep(StdDuration::from_secs(120)).await;

			assert!(gateway.renewed().is_empty());
		}
	}
}
