use std::time::{Duration, Instant};

use corpusmem_core::worker_pool;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn four_workers_mixed_durations_stay_within_bounds() {
  let durations: Vec<u64> = std::iter::once(1000).chain(std::iter::repeat(100).take(9)).collect();
  let start = Instant::now();

  let results = worker_pool::run(durations, 4, Duration::from_secs(5), CancellationToken::new(), |ms| async move {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    ms
  })
  .await;

  let elapsed = start.elapsed();
  assert_eq!(results.len(), 10);
  assert!(elapsed >= Duration::from_millis(1000), "elapsed={elapsed:?}");
  assert!(elapsed < Duration::from_millis(1200), "elapsed={elapsed:?}");
}
