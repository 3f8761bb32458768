//! Per-compilation execution context (spec §4.7, §5): carries the
//! cancellation signal, the run id used for the `changed` flag, and the
//! handle queries use to release their semaphore slot while blocked on a
//! peer or on resolver I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use proto_diagnostics::ExecutorError;

/// Shared cancellation flag. Cloning a [`Context`] shares the same
/// underlying flag, so cancelling one handle cancels every query running
/// under the same `Run`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Passed into every running query. Holds the `run_id` that tags freshly
/// computed cache entries, the cancellation token, and the permit the
/// query currently holds on the executor's global semaphore (if any).
#[derive(Clone)]
pub struct Context {
    run_id: u64,
    cancel: CancellationToken,
    semaphore: Arc<Semaphore>,
}

impl Context {
    pub(crate) fn new(run_id: u64, cancel: CancellationToken, semaphore: Arc<Semaphore>) -> Self {
        Self {
            run_id,
            cancel,
            semaphore,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns an error if the run has been cancelled; queries should call
    /// this at every suspension point (spec §5's cancel-aware suspension
    /// points).
    pub fn check_cancelled(&self) -> Result<(), ExecutorError> {
        if self.cancel.is_cancelled() {
            Err(ExecutorError::Cancelled("run was cancelled".to_string()))
        } else {
            Ok(())
        }
    }

    /// Runs `fut` while releasing `permit` for the duration, re-acquiring a
    /// fresh one before returning it alongside `fut`'s output. This is how
    /// a worker waiting on a peer (or blocked on resolver I/O) frees its
    /// global-semaphore slot for other workers, per spec §4.7's "the
    /// caller's worker releases its slot on the global semaphore while it
    /// is blocked, and re-acquires before returning".
    pub async fn suspend<F, T>(
        &self,
        permit: OwnedSemaphorePermit,
        fut: F,
    ) -> Result<(T, OwnedSemaphorePermit), ExecutorError>
    where
        F: std::future::Future<Output = T>,
    {
        drop(permit);
        let value = fut.await;
        self.check_cancelled()?;
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::Cancelled("semaphore closed".to_string()))?;
        Ok((value, permit))
    }

    pub(crate) async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, ExecutorError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::Cancelled("semaphore closed".to_string()))
    }
}
