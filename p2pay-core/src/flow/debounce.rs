//! Cancellable delayed task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A future that runs on the tokio runtime after a fixed delay, unless
/// cancelled first.
///
/// The deadline is fixed when the task is scheduled, not when the runtime
/// first polls it. Cancelling (or dropping the handle) stops the task
/// whether it is still waiting or already running the future.
///
/// Must be created from within a tokio runtime.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timer = tokio::time::sleep(delay);
        let handle = tokio::spawn(async move {
            timer.await;
            task.await;
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task ran to completion or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = DelayedTask::schedule(Duration::from_millis(500), counting_task(&counter));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_deadline() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = DelayedTask::schedule(Duration::from_millis(500), counting_task(&counter));

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _task =
                DelayedTask::schedule(Duration::from_millis(500), counting_task(&counter));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_running_future() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = counter.clone();
        let task = DelayedTask::schedule(Duration::from_millis(10), async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            inner.fetch_add(1, Ordering::SeqCst);
        });

        // Past the delay, inside the slow future.
        tokio::time::sleep(Duration::from_secs(1)).await;
        task.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
