//! Cycle detection by walking the caller chain (spec §4.7).
//!
//! The chain is kept as a task-local stack of string keys shared across
//! every [`crate::Executor`] in a process, rather than one stack per
//! typed executor: a cycle in practice runs through the linker calling
//! `Resolve` on an import, which calls back into the same linker query
//! for a different file, so the stack must see frames from every query
//! kind involved, not just one.

use proto_diagnostics::ExecutorError;
use std::cell::RefCell;
use std::future::Future;

tokio::task_local! {
    static CALL_STACK: RefCell<Vec<String>>;
}

/// The caller chain as seen from wherever this is called, empty if nothing
/// has pushed a frame yet (e.g. the very first query of a run).
pub fn current() -> Vec<String> {
    CALL_STACK.try_with(|stack| stack.borrow().clone()).unwrap_or_default()
}

/// Runs `fut` with `key` pushed onto `existing`, failing fast with
/// [`ExecutorError::Cycle`] if `key` is already present in it.
///
/// The chain is passed in explicitly rather than read from the ambient
/// task-local, because [`crate::Executor::resolve`] spawns each leader's
/// computation on a fresh `tokio` task, and task-locals do not cross a
/// `tokio::spawn` boundary — the caller must snapshot its own chain with
/// [`current`] before spawning and hand it to the spawned future, or a cycle
/// that runs through more than one query's worker task would go undetected.
///
/// The returned cycle path starts at the first occurrence of `key` in the
/// existing chain and ends with `key` repeated, so `cycle[n]` depends on
/// `cycle[n + 1]` reading left to right (spec §4.7, §8 scenario E).
pub async fn with_inherited_frame<F, T>(existing: Vec<String>, key: String, fut: F) -> Result<T, ExecutorError>
where
    F: Future<Output = T>,
{
    if let Some(start) = existing.iter().position(|k| k == &key) {
        let mut cycle = existing[start..].to_vec();
        cycle.push(key);
        return Err(ExecutorError::Cycle(cycle));
    }

    let mut next = existing;
    next.push(key);

    Ok(CALL_STACK.scope(RefCell::new(next), fut).await)
}

/// [`with_inherited_frame`] starting from the ambient task-local chain.
/// Correct only when `fut` runs in the same task as its caller; a leader
/// computation that gets `tokio::spawn`ed must call [`current`] before the
/// spawn and pass the result to [`with_inherited_frame`] instead.
pub async fn with_frame<F, T>(key: String, fut: F) -> Result<T, ExecutorError>
where
    F: Future<Output = T>,
{
    with_inherited_frame(current(), key, fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_direct_self_cycle() {
        let result = with_frame("a".to_string(), async {
            with_frame("a".to_string(), async { 1 }).await
        })
        .await;

        match result {
            Ok(Err(ExecutorError::Cycle(path))) => assert_eq!(path, vec!["a", "a"]),
            other => panic!("expected nested cycle error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn detects_indirect_cycle_with_full_path() {
        let result = with_frame("a".to_string(), async {
            with_frame("b".to_string(), async {
                with_frame("c".to_string(), async {
                    with_frame("a".to_string(), async { 1 }).await
                })
                .await
            })
            .await
        })
        .await;

        match result {
            Ok(Ok(Ok(Err(ExecutorError::Cycle(path))))) => {
                assert_eq!(path, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected nested cycle error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_cycle_when_keys_distinct() {
        let result = with_frame("a".to_string(), async {
            with_frame("b".to_string(), async { 42 }).await
        })
        .await;

        assert!(matches!(result, Ok(Ok(42))));
    }
}
