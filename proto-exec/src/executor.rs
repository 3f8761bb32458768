//! The keyed, memoizing scheduler itself (spec §4.7).
//!
//! Grounded on two pieces of the teacher stack: the bounded-concurrency
//! `Semaphore` + task pattern `project_code_store::clone_list` uses for
//! parallel cloning, generalized from "clone N repos" to "run N queries",
//! and `rag_store::embed_pool::embed_missing`'s `buffer_unordered` shape
//! for the batch-parallel `resolve_many` entry point.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{watch, Mutex as AsyncMutex, Semaphore};
use tracing::{debug, trace, warn};

use proto_diagnostics::ExecutorError;

use crate::call_stack;
use crate::context::{CancellationToken, Context};

/// One memoized computation, tagged with the `run_id` that produced it and
/// whether it was (re)computed during the *current* run.
#[derive(Debug, Clone)]
pub struct QueryResult<V> {
    pub value: V,
    pub run_id: u64,
    pub changed: bool,
}

/// What a query slot currently holds: nobody has started it yet, the
/// leader is still computing it, or it has a cached (possibly erroneous)
/// result.
#[derive(Clone)]
enum SlotState<V> {
    Pending,
    Ready(Result<QueryResult<V>, ExecutorError>),
}

struct Slot<V> {
    tx: watch::Sender<SlotState<V>>,
}

/// A single-typed memoizing executor: one instance is created per query
/// shape (e.g. "lower a file", "link a file"), each keyed by a stable
/// string-convertible key such as a file path.
///
/// `Executor` owns the global semaphore bounding how many query bodies may
/// run concurrently (spec §5's "bounded worker pool"); the cache itself is
/// a plain mutex-guarded map, matched against spec §5's "executor's task
/// map (keyed concurrent map)".
pub struct Executor<K, V> {
    semaphore: Arc<Semaphore>,
    entries: AsyncMutex<HashMap<K, Arc<Slot<V>>>>,
    run_id: AtomicU64,
}

impl<K, V> Executor<K, V>
where
    K: Eq + Hash + Clone + ToString + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `max_parallelism <= 0` is treated as unbounded (spec §6), modeled
    /// here as a very large but finite permit count since
    /// `tokio::sync::Semaphore` has no "infinite" mode.
    pub fn new(max_parallelism: isize) -> Self {
        let permits = if max_parallelism <= 0 {
            Semaphore::MAX_PERMITS
        } else {
            max_parallelism as usize
        };

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            entries: AsyncMutex::new(HashMap::new()),
            run_id: AtomicU64::new(0),
        }
    }

    /// Starts a new `Run`: every cache entry freshly computed after this
    /// call is tagged with a `run_id` one greater than any previous run,
    /// so callers can tell freshly recomputed results from ones served out
    /// of an older run's cache (spec §4.7's `changed` flag).
    pub fn begin_run(&self, cancel: CancellationToken) -> (u64, Context) {
        let run_id = self.run_id.fetch_add(1, Ordering::SeqCst) + 1;
        (run_id, Context::new(run_id, cancel, self.semaphore.clone()))
    }

    /// Resolves a single query, becoming its leader if nobody else has
    /// started it yet, or waiting on the leader's broadcast otherwise.
    pub async fn resolve<F, Fut>(
        &self,
        ctx: &Context,
        key: K,
        compute: F,
    ) -> Result<QueryResult<V>, ExecutorError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ExecutorError>> + Send + 'static,
    {
        ctx.check_cancelled()?;

        let key_string = key.to_string();
        let (slot, am_leader, mut rx) = {
            let mut entries = self.entries.lock().await;
            match entries.get(&key) {
                Some(slot) => {
                    let rx = slot.tx.subscribe();
                    (slot.clone(), false, rx)
                }
                None => {
                    let (tx, rx) = watch::channel(SlotState::Pending);
                    let slot = Arc::new(Slot { tx });
                    entries.insert(key.clone(), slot.clone());
                    (slot, true, rx)
                }
            }
        };

        if !am_leader {
            trace!(key = %key_string, "waiting for leader");
            return self.await_leader(ctx, &key, &mut rx).await;
        }

        let run_id = ctx.run_id();
        debug!(key = %key_string, run_id, "became leader");

        let permit = ctx.acquire_permit().await?;
        let worker_ctx = ctx.clone();
        let task_key = key_string.clone();

        // `compute` runs on a freshly spawned task, which does not inherit
        // the caller's task-local call stack, so the chain built up so far
        // is snapshotted here and threaded through explicitly — otherwise a
        // cycle spanning more than one query's worker task would never be
        // detected (see `call_stack::with_inherited_frame`).
        let inherited = call_stack::current();
        let outcome = tokio::spawn(call_stack::with_inherited_frame(
            inherited,
            task_key.clone(),
            async move { compute(worker_ctx).await },
        ))
        .await;

        drop(permit);

        let result: Result<QueryResult<V>, ExecutorError> = match outcome {
            Ok(Ok(Ok(value))) => Ok(QueryResult {
                value,
                run_id,
                changed: true,
            }),
            Ok(Ok(Err(err))) => Err(err),
            Ok(Err(cycle)) => Err(cycle),
            Err(join_err) => {
                warn!(key = %task_key, "query leader panicked, resetting slot");
                self.entries.lock().await.remove(&key);
                let message = if join_err.is_panic() {
                    panic_message(join_err)
                } else {
                    "leader task was cancelled".to_string()
                };
                drop(slot);
                return Err(ExecutorError::Panic {
                    key: task_key,
                    message,
                });
            }
        };

        let _ = slot.tx.send(SlotState::Ready(result.clone()));
        result
    }

    async fn await_leader(
        &self,
        ctx: &Context,
        key: &K,
        rx: &mut watch::Receiver<SlotState<V>>,
    ) -> Result<QueryResult<V>, ExecutorError> {
        loop {
            if let SlotState::Ready(result) = &*rx.borrow() {
                // The cached result may have been computed in an earlier
                // run; `changed` must reflect whether *this* run did the
                // work, not whether the leader's run did.
                return result.clone().map(|r| QueryResult {
                    changed: r.run_id == ctx.run_id(),
                    ..r
                });
            }

            ctx.check_cancelled()?;

            if rx.changed().await.is_err() {
                // The leader's slot was dropped without ever sending a
                // result (e.g. the executor itself is shutting down);
                // nothing left to wait on, ask the caller to retry.
                let key_string = key.to_string();
                return Err(ExecutorError::Cancelled(format!(
                    "leader for {key_string} disappeared"
                )));
            }
        }
    }

    /// Runs every `(key, compute)` pair concurrently (bounded by the
    /// shared semaphore) and collects their results in input order, the
    /// async analogue of `project_code_store::clone_list`'s
    /// `Semaphore` + join pattern.
    pub async fn resolve_many<F, Fut>(
        &self,
        ctx: &Context,
        queries: Vec<(K, F)>,
    ) -> Vec<Result<QueryResult<V>, ExecutorError>>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ExecutorError>> + Send + 'static,
    {
        let futs = queries
            .into_iter()
            .map(|(key, compute)| self.resolve(ctx, key, compute));

        join_all(futs).await
    }
}

fn panic_message(join_err: tokio::task::JoinError) -> String {
    match join_err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "panic payload was not a string".to_string()
            }
        }
        Err(join_err) => join_err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn second_call_is_served_from_cache_without_recomputation() {
        let executor: Executor<String, i32> = Executor::new(4);
        let (_, ctx) = executor.begin_run(CancellationToken::new());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let result = executor
                .resolve(&ctx, "k".to_string(), move |_ctx| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(result.value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_is_false_when_served_from_an_earlier_run() {
        let executor: Executor<String, i32> = Executor::new(4);

        let (_, ctx1) = executor.begin_run(CancellationToken::new());
        let first = executor.resolve(&ctx1, "k".to_string(), |_ctx| async move { Ok(7) }).await.unwrap();
        assert!(first.changed);

        let (_, ctx2) = executor.begin_run(CancellationToken::new());
        let second = executor.resolve(&ctx2, "k".to_string(), |_ctx| async move { Ok(7) }).await.unwrap();
        assert_eq!(second.value, 7);
        assert!(!second.changed, "value came from ctx1's run, not ctx2's");
    }

    #[tokio::test]
    async fn panic_resets_slot_for_retry() {
        let executor: Executor<String, i32> = Executor::new(4);
        let (_, ctx) = executor.begin_run(CancellationToken::new());

        let first = executor
            .resolve(&ctx, "k".to_string(), |_ctx| async move {
                panic!("boom");
                #[allow(unreachable_code)]
                Ok(0)
            })
            .await;
        assert!(matches!(first, Err(ExecutorError::Panic { .. })));

        let second = executor
            .resolve(&ctx, "k".to_string(), |_ctx| async move { Ok(9) })
            .await
            .unwrap();
        assert_eq!(second.value, 9);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let executor = Arc::new(Executor::<String, i32>::new(4));
        let (_, ctx) = executor.begin_run(CancellationToken::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let executor = executor.clone();
            let ctx = ctx.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                executor
                    .resolve(&ctx, "shared".to_string(), move |_ctx| {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                            Ok(3)
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().value, 3);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
