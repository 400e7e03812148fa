// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session lifecycle events.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	logins: AtomicU64,
	login_failures: AtomicU64,
	renewals: AtomicU64,
	rejections: AtomicU64,
	renewal_failures: AtomicU64,
	revocations: AtomicU64,
	revocation_failures: AtomicU64,
}
impl SessionMetrics {
	/// Returns the number of successful logins.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of failed logins.
	pub fn login_failures(&self) -> u64 {
		self.login_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of successful renewals.
	pub fn renewals(&self) -> u64 {
		self.renewals.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals the backend rejected (token invalidated).
	pub fn rejections(&self) -> u64 {
		self.rejections.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals that failed with a server or transport error.
	pub fn renewal_failures(&self) -> u64 {
		self.renewal_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of successful revocations.
	pub fn revocations(&self) -> u64 {
		self.revocations.load(Ordering::Relaxed)
	}

	/// Returns the number of failed revocations.
	pub fn revocation_failures(&self) -> u64 {
		self.revocation_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_login(&self, ok: bool) {
		let counter = if ok { &self.logins } else { &self.login_failures };

		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal(&self) {
		self.renewals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejections.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal_failure(&self) {
		self.renewal_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revocation(&self, ok: bool) {
		let counter = if ok { &self.revocations } else { &self.revocation_failures };

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
