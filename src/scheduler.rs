//! Task-execution contracts that drive background token renewal.
//!
//! The session manager accepts any [`TaskExecutor`]. Executors that can also re-run a task at a
//! fixed delay expose that through [`TaskExecutor::as_scheduler`]; the session then registers a
//! single recurring task and never re-arms it by hand. Plain executors get a one-shot delayed
//! task that re-arms itself after every successful renewal.

mod runtime;

pub use runtime::*;

// std
use std::{ops::ControlFlow, time::Duration as StdDuration};
// self
use crate::_prelude::*;

/// Fire-and-forget unit of work.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + 'static + Send>>;

/// One run of a recurring task; `Break` ends the recurrence.
pub type TickFuture = Pin<Box<dyn Future<Output = ControlFlow<()>> + 'static + Send>>;

/// Factory invoked by a [`TaskScheduler`] every time the fixed delay elapses.
pub type RecurringTask = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Smallest delay between two renewal attempts.
pub const MIN_REFRESH_DELAY: Duration = Duration::SECOND;

/// Executes background work for the session manager.
pub trait TaskExecutor
where
	Self: Send + Sync,
{
	/// Runs `task` in the background.
	fn execute(&self, task: TaskFuture);

	/// Returns the fixed-delay capability when the executor offers one.
	fn as_scheduler(&self) -> Option<&dyn TaskScheduler> {
		None
	}
}

/// Executor that can re-run a task with a fixed delay between runs.
pub trait TaskScheduler: TaskExecutor {
	/// Runs `task` after `delay`, then again `delay` after each run completes, until a run
	/// returns [`ControlFlow::Break`].
	fn schedule_with_fixed_delay(&self, delay: StdDuration, task: RecurringTask);
}

/// Delay before the next renewal: `max(1s, lease - margin)`.
pub fn refresh_delay(lease: Duration, margin: Duration) -> Duration {
	lease.saturating_sub(margin).max(MIN_REFRESH_DELAY)
}

/// Wraps `task` so it starts after `delay`.
pub fn delayed(delay: StdDuration, task: TaskFuture) -> TaskFuture {
	Box::pin(async move {
		tokio::time::sleep(delay).await;

		task.await;
	})
}

pub(crate) fn to_std(delay: Duration) -> StdDuration {
	StdDuration::try_from(delay).unwrap_or(StdDuration::from_secs(1))
}
