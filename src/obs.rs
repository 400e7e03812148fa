//! Optional observability helpers for session operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every backend call in a `vault_session.op` span carrying the `op`
//!   and `stage` fields, and to emit lifecycle events (scheduling, rejection, failures).
//! - Enable `metrics` to increment the `vault_session_op_total` counter for every
//!   attempt/success/rejection/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Backend operations observed by the session manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOp {
	/// Login through the configured authentication.
	Login,
	/// Token self-renewal.
	Renew,
	/// Token self-revocation at shutdown.
	Revoke,
}
impl SessionOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionOp::Login => "login",
			SessionOp::Renew => "renew",
			SessionOp::Revoke => "revoke",
		}
	}
}
impl Display for SessionOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a backend call.
	Attempt,
	/// Successful completion.
	Success,
	/// Backend rejected the token (4xx class); not an error.
	Rejected,
	/// Failure propagated back to the caller or logged.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Rejected => "rejected",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
