use crate::error::AppResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Success hook, invoked exactly once after every task in a sealed batch
/// has succeeded
#[async_trait]
pub trait BatchCompletionHandler: Send + Sync {
    async fn on_batch_completed(&self, batch_id: &str);
}

/// Failure hook, invoked once on the first failing task of a batch;
/// later failures in the same batch do not re-invoke it
#[async_trait]
pub trait BatchFailureHandler: Send + Sync {
    async fn on_batch_failed(&self, batch_id: &str, error: &crate::error::AppError);
}

struct BatchInner {
    id: String,
    name: String,
    cancelled: AtomicBool,
    /// Set once the dispatcher has finished adding tasks; completion can
    /// only fire afterwards, so an early-finishing first chunk cannot
    /// complete a batch that is still being filled
    sealed: AtomicBool,
    remaining: AtomicUsize,
    failed: AtomicBool,
    completion_fired: AtomicBool,
    on_complete: Arc<dyn BatchCompletionHandler>,
    on_failure: Arc<dyn BatchFailureHandler>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BatchInner {
    async fn child_finished(&self, error: Option<crate::error::AppError>) {
        if let Some(err) = error {
            // First failure wins; the rest only decrement the counter
            if !self.failed.swap(true, Ordering::SeqCst) {
                warn!(batch = %self.id, name = %self.name, error = %err, "batch task failed");
                self.on_failure.on_batch_failed(&self.id, &err).await;
            }
        }

        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.maybe_complete().await;
        }
    }

    async fn maybe_complete(&self) {
        let done = self.sealed.load(Ordering::SeqCst)
            && self.remaining.load(Ordering::SeqCst) == 0
            && !self.failed.load(Ordering::SeqCst)
            && !self.cancelled.load(Ordering::SeqCst);

        if done && !self.completion_fired.swap(true, Ordering::SeqCst) {
            debug!(batch = %self.id, name = %self.name, "batch completed");
            self.on_complete.on_batch_completed(&self.id).await;
        }
    }
}

/// Handle to one batch of parallel tasks
///
/// In-process stand-in for the queue/batch transport: tasks are tokio
/// tasks, delivery is exactly-once here, but every consumer is written
/// for the at-least-once contract the boundary specifies.
#[derive(Clone)]
pub struct BatchHandle {
    inner: Arc<BatchInner>,
}

impl BatchHandle {
    /// Create an empty, unsealed batch with its outcome handlers
    pub fn new(
        name: impl Into<String>,
        on_complete: Arc<dyn BatchCompletionHandler>,
        on_failure: Arc<dyn BatchFailureHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(BatchInner {
                id: Uuid::new_v4().to_string(),
                name: name.into(),
                cancelled: AtomicBool::new(false),
                sealed: AtomicBool::new(false),
                remaining: AtomicUsize::new(0),
                failed: AtomicBool::new(false),
                completion_fired: AtomicBool::new(false),
                on_complete,
                on_failure,
                handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identifier persisted on the owning import
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Add one task to the batch and start it
    ///
    /// Tasks added to a cancelled batch are skipped without running.
    pub async fn add_task<F>(&self, task: F)
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.inner.remaining.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            if inner.cancelled.load(Ordering::SeqCst) {
                inner.child_finished(None).await;
                return;
            }

            match task.await {
                Ok(()) => inner.child_finished(None).await,
                Err(err) => inner.child_finished(Some(err)).await,
            }
        });

        self.inner.handles.lock().await.push(handle);
    }

    /// Mark the batch fully dispatched; completion can fire from now on
    pub async fn seal(&self) {
        self.inner.sealed.store(true, Ordering::SeqCst);
        self.inner.maybe_complete().await;
    }

    /// Cancel the batch; tasks that have not started yet become no-ops
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the batch has been cancelled
    pub fn cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Whether any task has failed
    pub fn has_failures(&self) -> bool {
        self.inner.failed.load(Ordering::SeqCst)
    }

    /// Await every task spawned into this batch (test/shutdown aid);
    /// outcome hooks have run by the time this returns
    pub async fn wait(&self) {
        let handles = std::mem::take(&mut *self.inner.handles.lock().await);
        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                warn!(batch = %self.inner.id, error = %err, "batch task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct RecordingHooks {
        completed: AtomicUsize,
        failed: AtomicUsize,
        last_error: Mutex<Option<String>>,
    }

    impl RecordingHooks {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                last_error: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl BatchCompletionHandler for RecordingHooks {
        async fn on_batch_completed(&self, _batch_id: &str) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BatchFailureHandler for RecordingHooks {
        async fn on_batch_failed(&self, _batch_id: &str, error: &AppError) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            *self.last_error.lock().await = Some(error.to_string());
        }
    }

    #[tokio::test]
    async fn test_completion_fires_once_after_seal() {
        let hooks = RecordingHooks::new();
        let batch = BatchHandle::new("test", hooks.clone(), hooks.clone());

        for _ in 0..4 {
            batch.add_task(async { Ok(()) }).await;
        }
        batch.seal().await;
        batch.wait().await;

        assert_eq!(hooks.completed.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.failed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_waits_for_seal() {
        let hooks = RecordingHooks::new();
        let batch = BatchHandle::new("test", hooks.clone(), hooks.clone());

        batch.add_task(async { Ok(()) }).await;
        batch.wait().await;

        // All tasks finished, but the batch is still being filled
        assert_eq!(hooks.completed.load(Ordering::SeqCst), 0);

        batch.seal().await;
        assert_eq!(hooks.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_failure_only_invokes_failure_hook_once() {
        let hooks = RecordingHooks::new();
        let batch = BatchHandle::new("test", hooks.clone(), hooks.clone());

        batch
            .add_task(async { Err(AppError::Message("first".into())) })
            .await;
        batch.wait().await;
        batch
            .add_task(async { Err(AppError::Message("second".into())) })
            .await;
        batch.seal().await;
        batch.wait().await;

        assert_eq!(hooks.failed.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.completed.load(Ordering::SeqCst), 0);
        assert_eq!(
            hooks.last_error.lock().await.as_deref(),
            Some("first")
        );
    }

    #[tokio::test]
    async fn test_cancelled_batch_skips_tasks_and_never_completes() {
        let hooks = RecordingHooks::new();
        let batch = BatchHandle::new("test", hooks.clone(), hooks.clone());

        batch.cancel();
        batch
            .add_task(async { panic!("task must not run after cancellation") })
            .await;
        batch.seal().await;
        batch.wait().await;

        assert!(batch.cancelled());
        assert_eq!(hooks.completed.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.failed.load(Ordering::SeqCst), 0);
    }
}
