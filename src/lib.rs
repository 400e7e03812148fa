//! Lifecycle-aware Vault token sessions: lazy exactly-once login, background self-renewal before
//! the lease runs out, and transparent re-login once the backend invalidates a token.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod gateway;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
pub mod scheduler;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and scripted collaborators for tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		auth::{ClientAuthentication, LoginFuture, Token},
		gateway::{BackendFailure, GatewayFuture, RenewalOutcome, SessionGateway},
	};

	/// Authentication double that mints a fresh login token per call and counts invocations.
	#[derive(Debug)]
	pub struct CountingAuthentication {
		logins: AtomicUsize,
		lease: Duration,
		renewable: bool,
		latency: Option<std::time::Duration>,
		fail: bool,
	}
	impl CountingAuthentication {
		/// Issues renewable tokens with the provided lease.
		pub fn renewable(lease: Duration) -> Self {
			Self { logins: AtomicUsize::new(0), lease, renewable: true, latency: None, fail: false }
		}

		/// Issues login tokens the backend refuses to renew.
		pub fn non_renewable(lease: Duration) -> Self {
			Self { renewable: false, ..Self::renewable(lease) }
		}

		/// Rejects every login attempt.
		pub fn failing() -> Self {
			Self { fail: true, ..Self::renewable(Duration::ZERO) }
		}

		/// Delays every login so concurrent callers overlap.
		pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
			self.latency = Some(latency);

			self
		}

		/// Number of `login` calls observed so far.
		pub fn logins(&self) -> usize {
			self.logins.load(Ordering::SeqCst)
		}
	}
	impl ClientAuthentication for CountingAuthentication {
		fn login(&self) -> LoginFuture<'_> {
			Box::pin(async move {
				let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;

				if let Some(latency) = self.latency {
					tokio::time::sleep(latency).await;
				}
				if self.fail {
					return Err(Error::Authentication { reason: "login rejected".into() });
				}

				Ok(Token::login(format!("token-{n}"))
					.lease_duration(self.lease)
					.renewable(self.renewable)
					.build()?)
			})
		}
	}

	/// Gateway double that replays scripted renewal outcomes and records every call.
	#[derive(Debug, Default)]
	pub struct ScriptedGateway {
		script: Mutex<VecDeque<RenewalOutcome>>,
		renewed: Mutex<Vec<String>>,
		revoked: Mutex<Vec<String>>,
		revoke_failure: Mutex<Option<BackendFailure>>,
		renew_latency: Option<std::time::Duration>,
		revoke_latency: Option<std::time::Duration>,
	}
	impl ScriptedGateway {
		/// Queues outcomes; once drained every renewal succeeds.
		pub fn with_script(outcomes: impl IntoIterator<Item = RenewalOutcome>) -> Self {
			Self { script: Mutex::new(outcomes.into_iter().collect()), ..Default::default() }
		}

		/// Makes every revoke call fail with the provided detail.
		pub fn failing_revoke(self, failure: BackendFailure) -> Self {
			*self.revoke_failure.lock() = Some(failure);

			self
		}

		/// Delays every renew and revoke call so it holds the session's transition lock.
		pub fn with_latency(
			mut self,
			renew: std::time::Duration,
			revoke: std::time::Duration,
		) -> Self {
			self.renew_latency = Some(renew);
			self.revoke_latency = Some(revoke);

			self
		}

		/// Secrets passed to `renew`, in call order.
		pub fn renewed(&self) -> Vec<String> {
			self.renewed.lock().clone()
		}

		/// Secrets passed to `revoke`, in call order.
		pub fn revoked(&self) -> Vec<String> {
			self.revoked.lock().clone()
		}
	}
	impl SessionGateway for ScriptedGateway {
		fn renew<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, RenewalOutcome> {
			Box::pin(async move {
				self.renewed.lock().push(token.secret().expose().to_owned());

				if let Some(latency) = self.renew_latency {
					tokio::time::sleep(latency).await;
				}

				self.script.lock().pop_front().unwrap_or(RenewalOutcome::Renewed)
			})
		}

		fn revoke<'a>(&'a self, token: &'a Token) -> GatewayFuture<'a, Result<(), BackendFailure>> {
			Box::pin(async move {
				self.revoked.lock().push(token.secret().expose().to_owned());

				if let Some(latency) = self.revoke_latency {
					tokio::time::sleep(latency).await;
				}

				match self.revoke_failure.lock().clone() {
					Some(failure) => Err(failure),
					None => Ok(()),
				}
			})
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{Arc, Weak},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
