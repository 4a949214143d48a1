use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Generic bounded parallel executor: `jobs` are pulled from a shared queue
/// by `worker_count` workers, each claiming the next job dynamically so a
/// slow job never stalls an idle worker. Each job is wrapped with `timeout`
/// and driven by `process`. Results are returned in completion order.
///
/// Cancellation via `cancel` stops in-flight jobs at their next await point
/// and drops queued jobs without running them.
pub async fn run<J, R, F, Fut>(
  jobs: Vec<J>,
  worker_count: usize,
  timeout: Duration,
  cancel: CancellationToken,
  process: F,
) -> Vec<R>
where
  J: Send + 'static,
  R: Send + 'static,
  F: Fn(J) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = R> + Send,
{
  let worker_count = worker_count.max(1);
  let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
  let process = Arc::new(process);

  let mut set = JoinSet::new();
  for _ in 0..worker_count {
    let queue = Arc::clone(&queue);
    let process = Arc::clone(&process);
    let cancel = cancel.clone();
    set.spawn(async move {
      let mut results = Vec::new();
      loop {
        if cancel.is_cancelled() {
          break;
        }
        let job = {
          let mut queue = queue.lock().await;
          queue.pop_front()
        };
        let Some(job) = job else { break };

        let outcome = tokio::select! {
          () = cancel.cancelled() => break,
          result = tokio::time::timeout(timeout, process(job)) => result,
        };
        if let Ok(result) = outcome {
          results.push(result);
        }
      }
      results
    });
  }

  let mut all_results = Vec::new();
  while let Some(joined) = set.join_next().await {
    if let Ok(mut results) = joined {
      all_results.append(&mut results);
    }
  }
  all_results
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Instant;

  use super::*;

  #[tokio::test]
  async fn mixed_durations_finish_faster_than_partitioned_worst_case() {
    let durations: Vec<u64> = std::iter::once(100).chain(std::iter::repeat(10).take(9)).collect();
    let start = Instant::now();

    let results = run(durations, 4, Duration::from_secs(1), CancellationToken::new(), |ms| async move {
      tokio::time::sleep(Duration::from_millis(ms)).await;
      ms
    })
    .await;

    let elapsed = start.elapsed();
    assert_eq!(results.len(), 10);
    assert!(elapsed < Duration::from_millis(200), "elapsed={elapsed:?}");
  }

  #[tokio::test]
  async fn cancellation_stops_remaining_jobs() {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let started = Arc::new(AtomicUsize::new(0));
    let started_clone = Arc::clone(&started);

    let jobs = vec![0u64; 20];
    let handle = tokio::spawn(async move {
      run(jobs, 2, Duration::from_secs(5), cancel_clone, move |_| {
        let started = Arc::clone(&started_clone);
        async move {
          started.fetch_add(1, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(50)).await;
        }
      })
      .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(started.load(Ordering::SeqCst) < 20);
  }
}
