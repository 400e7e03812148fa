// std
use std::{ops::ControlFlow, time::Duration as StdDuration};
// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	scheduler::{RecurringTask, TaskExecutor, TaskFuture, TaskScheduler},
};

/// One-shot executor that spawns tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
	handle: Handle,
}
impl TokioExecutor {
	/// Spawns onto the provided runtime handle.
	pub fn new(handle: Handle) -> Self {
		Self { handle }
	}

	/// Spawns onto the runtime the caller is running in.
	pub fn try_current() -> Result<Self, ConfigError> {
		Handle::try_current().map(Self::new).map_err(|_| ConfigError::NoRuntime)
	}
}
impl TaskExecutor for TokioExecutor {
	fn execute(&self, task: TaskFuture) {
		self.handle.spawn(task);
	}
}

/// Executor with a fixed-delay recurring primitive on a tokio runtime.
///
/// The delay is measured from the end of one run to the start of the next, so slow backend calls
/// push later runs back instead of piling up.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
	handle: Handle,
}
impl TokioScheduler {
	/// Spawns onto the provided runtime handle.
	pub fn new(handle: Handle) -> Self {
		Self { handle }
	}

	/// Spawns onto the runtime the caller is running in.
	pub fn try_current() -> Result<Self, ConfigError> {
		Handle::try_current().map(Self::new).map_err(|_| ConfigError::NoRuntime)
	}
}
impl TaskExecutor for TokioScheduler {
	fn execute(&self, task: TaskFuture) {
		self.handle.spawn(task);
	}

	fn as_scheduler(&self) -> Option<&dyn TaskScheduler> {
		Some(self)
	}
}
impl TaskScheduler for TokioScheduler {
	fn schedule_with_fixed_delay(&self, delay: StdDuration, task: RecurringTask) {
		self.handle.spawn(async move {
			loop {
				tokio::time::sleep(delay).await;

				if let ControlFlow::Break(()) = task().await {
					break;
				}
			}
		});
	}
}
