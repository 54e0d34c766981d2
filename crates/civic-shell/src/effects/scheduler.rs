//! Deferred task scheduling.
//!
//! Used for the identity switch, which simulates a backend context reload
//! with a fixed delay. Handles are cancellable; whether a caller ever cancels
//! is its own policy. The same capability runs background work started from
//! synchronous callbacks, such as a camera request.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use uuid::Uuid;

/// A unit of deferred work.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Work to drive to completion in the background.
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a scheduled task.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    id: Uuid,
    cancelled: Arc<AtomicBool>,
}

impl Default for ScheduledTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduledTask {
    /// Fresh, not cancelled handle
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Prevent the task from running if it has not run yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Scheduling capability.
pub trait SchedulerEffects: Send + Sync {
    /// Run `task` once after `delay`, unless the returned handle is cancelled
    /// first. Implementations must not run the task inline.
    fn schedule(&self, delay: Duration, task: DeferredTask) -> ScheduledTask;

    /// Drive `task` to completion without blocking the caller.
    fn spawn(&self, task: BackgroundTask);
}

/// Scheduler backed by tokio timers.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl SchedulerEffects for TokioScheduler {
    fn schedule(&self, delay: Duration, task: DeferredTask) -> ScheduledTask {
        let scheduled = ScheduledTask::new();
        let guard = scheduled.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.is_cancelled() {
                tracing::debug!(task = %guard.id(), "deferred task cancelled before firing");
                return;
            }
            task();
        });
        scheduled
    }

    fn spawn(&self, task: BackgroundTask) {
        self.handle.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_after_delay() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        scheduler.schedule(
            Duration::from_millis(1500),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_runs() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let handle = scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawn_runs_on_runtime() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let (done, finished) = tokio::sync::oneshot::channel();
        scheduler.spawn(Box::pin(async move {
            let _ = done.send(7);
        }));
        assert_eq!(finished.await, Ok(7));
    }
}
