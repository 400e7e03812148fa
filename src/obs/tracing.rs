// self
use crate::{_prelude::*, gateway::BackendFailure, obs::SessionOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used around backend calls.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: SessionOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("vault_session.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn refresh_scheduled(delay: Duration, strategy: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(delay_secs = delay.whole_seconds(), strategy, "Scheduling token refresh");
	#[cfg(not(feature = "tracing"))]
	let _ = (delay, strategy);
}

pub(crate) fn renewal_rejected(failure: &BackendFailure) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		error = %failure,
		"Cannot refresh token, resetting token and performing re-login"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = failure;
}

pub(crate) fn refresh_failed(error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(error = %error, "Cannot refresh token");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

pub(crate) fn revoke_failed(failure: &BackendFailure) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %failure, "Cannot revoke token");
	#[cfg(not(feature = "tracing"))]
	let _ = failure;
}

pub(crate) fn cycle_abandoned(reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(reason, "Token refresh cycle ended");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}
