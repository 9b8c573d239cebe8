//! Slot-based scheduler with a shared claim cursor.
//!
//! A batch of `n` tasks is driven by `min(limit, n)` slots. Each slot claims
//! the lowest unclaimed task index, invokes the executor on it, and on
//! settlement stores the outcome at that same index before claiming the next
//! one. The claim cursor advances strictly left to right, so the initial
//! fan-out starts tasks `0..limit` in order and the result vector's index
//! correspondence holds regardless of completion order.

use std::future::Future;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

/// What a task error does to the rest of the batch.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FailurePolicy {
    /// First error fails the batch; in-flight tasks are dropped.
    Abort,
    /// Each slot records its own task's outcome; the batch always completes.
    Capture,
}

/// Run every task, failing the whole batch on the first task error.
///
/// At most `limit` tasks are in flight at once; `0` means no limit
/// (every task starts immediately). The resolved vector preserves input
/// order: index `i` holds the result of `tasks[i]` no matter which slot
/// processed it or when it finished.
///
/// On the first task error the batch aborts: unclaimed tasks are never
/// started, and in-flight tasks are dropped without their settlement being
/// observed. For per-task error capture see [`run_settled`].
///
/// # Errors
///
/// Returns the first task error to settle.
pub async fn try_run<T, R, E, F, Fut>(tasks: Vec<T>, limit: usize, execute: F) -> Result<Vec<R>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    drain(tasks, limit, execute, FailurePolicy::Abort)
        .await?
        .into_iter()
        .collect()
}

/// Run every task to settlement, capturing each task's outcome in its slot.
///
/// At most `limit` tasks are in flight at once; `0` means no limit. A
/// failing task does not fail the batch: slot `i` holds `tasks[i]`'s own
/// `Result`, so callers decide per slot how to treat errors.
pub async fn run_settled<T, R, E, F, Fut>(
    tasks: Vec<T>,
    limit: usize,
    execute: F,
) -> Vec<Result<R, E>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let Ok(slots) = drain(tasks, limit, execute, FailurePolicy::Capture).await else {
        unreachable!("capture policy never aborts the batch");
    };
    slots
}

/// Shared scheduler for both failure policies.
///
/// Owns the claim cursor (an enumerated task iterator), the in-flight set,
/// and the output slots; all mutation happens in the single drain loop
/// below.
async fn drain<T, R, E, F, Fut>(
    tasks: Vec<T>,
    limit: usize,
    mut execute: F,
    policy: FailurePolicy,
) -> Result<Vec<Result<R, E>>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let total = tasks.len();
    let limit = if limit == 0 { total } else { limit.min(total) };
    tracing::debug!(total, limit, "starting batch");

    let mut slots: Vec<Option<Result<R, E>>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);

    // The claim cursor: executors are invoked lazily, at claim time, and
    // each claimed future is tagged with its task's input index.
    let mut cursor = tasks.into_iter().enumerate().map(move |(index, task)| {
        tracing::trace!(index, "task claimed");
        let fut = execute(task);
        async move { (index, fut.await) }
    });
    let mut in_flight = FuturesUnordered::new();

    // Initial fan-out: claim indices 0..limit, in order.
    while in_flight.len() < limit {
        let Some(claim) = cursor.next() else {
            break;
        };
        in_flight.push(claim);
    }

    while let Some((index, outcome)) = in_flight.next().await {
        tracing::trace!(index, ok = outcome.is_ok(), "task settled");
        match outcome {
            Err(err) if policy == FailurePolicy::Abort => {
                tracing::debug!(
                    index,
                    abandoned = in_flight.len(),
                    "task failed, aborting batch"
                );
                return Err(err);
            }
            outcome => slots[index] = Some(outcome),
        }

        // The freed slot claims the next unclaimed task, if any remain.
        if let Some(claim) = cursor.next() {
            in_flight.push(claim);
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| slot.expect("every claimed index settles exactly once"))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::sleep;

    use super::{run_settled, try_run};

    #[tokio::test]
    async fn resolves_in_input_order_despite_completion_order() {
        let delays: Vec<(usize, u64)> = [30_u64, 10, 20, 5, 25]
            .into_iter()
            .enumerate()
            .collect();
        let results = try_run(delays, 2, |(index, delay)| async move {
            sleep(Duration::from_millis(delay)).await;
            Ok::<_, String>(index * 10)
        })
        .await
        .expect("batch succeeds");

        assert_eq!(results, vec![0, 10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn freed_slot_claims_lowest_remaining_index() {
        // Tasks 1 and 2 start immediately; task 2 finishes first and frees
        // the slot that then claims task 3. Results stay in input order.
        let started = Arc::new(Mutex::new(Vec::new()));
        let log = started.clone();
        let tasks = vec![(1_u64, 30_u64), (2, 10), (3, 20)];

        let results = try_run(tasks, 2, move |(id, delay)| {
            log.lock().expect("log lock").push(id);
            async move {
                sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>(id * 10)
            }
        })
        .await
        .expect("batch succeeds");

        assert_eq!(results, vec![10, 20, 30]);
        assert_eq!(*started.lock().expect("log lock"), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, high) = (in_flight.clone(), peak.clone());

        let tasks: Vec<u32> = (0..6).collect();
        let results = try_run(tasks, 2, move |n| {
            let current = current.clone();
            let high = high.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                high.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(n)
            }
        })
        .await
        .expect("batch succeeds");

        assert_eq!(results, (0..6).collect::<Vec<_>>());
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_limit_launches_everything_at_once() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, high) = (in_flight.clone(), peak.clone());

        let tasks: Vec<u32> = (0..4).collect();
        let results = try_run(tasks, 0, move |n| {
            let current = current.clone();
            let high = high.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                high.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(n)
            }
        })
        .await
        .expect("batch succeeds");

        assert_eq!(results, (0..4).collect::<Vec<_>>());
        assert_eq!(peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_batch_resolves_without_executing() {
        let calls = AtomicUsize::new(0);
        let results = try_run(Vec::<u32>::new(), 3, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, String>(n) }
        })
        .await
        .expect("empty batch succeeds");

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn limit_larger_than_batch_behaves_like_unbounded() {
        let tasks: Vec<u32> = (0..3).collect();
        let results = try_run(tasks, 100, |n| async move { Ok::<_, String>(n + 1) })
            .await
            .expect("batch succeeds");

        assert_eq!(results, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn abort_policy_stops_claiming_after_failure() {
        let calls = AtomicUsize::new(0);
        let outcome = try_run(vec![1_u32, 2, 3], 1, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 2 {
                    Err(format!("task {n} failed"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(outcome, Err("task 2 failed".to_string()));
        // Task 3 was never claimed.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abort_policy_abandons_in_flight_tasks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();

        let tasks = vec![("ok", 40_u64), ("boom", 5), ("unclaimed", 1)];
        let outcome = try_run(tasks, 2, move |(name, delay)| {
            let done = done.clone();
            async move {
                sleep(Duration::from_millis(delay)).await;
                if name == "boom" {
                    Err(name.to_string())
                } else {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(name)
                }
            }
        })
        .await;

        assert_eq!(outcome, Err("boom".to_string()));
        // The slow in-flight task was dropped mid-sleep, never finishing.
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn settled_policy_keeps_every_slot_in_order() {
        let tasks: Vec<(u32, u64)> = vec![(1, 20), (2, 5), (3, 10)];
        let slots = run_settled(tasks, 2, |(n, delay)| async move {
            sleep(Duration::from_millis(delay)).await;
            if n == 2 {
                Err(format!("task {n} failed"))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        assert_eq!(
            slots,
            vec![Ok(10), Err("task 2 failed".to_string()), Ok(30)]
        );
    }

    #[tokio::test]
    async fn settled_policy_runs_every_task_despite_failures() {
        let calls = AtomicUsize::new(0);
        let slots = run_settled(vec![1_u32, 2, 3, 4], 1, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<u32, _>(format!("task {n} failed")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(slots.iter().all(Result::is_err));
    }
}
