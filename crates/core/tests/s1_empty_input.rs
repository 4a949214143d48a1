use std::sync::Arc;

use corpusmem_core::domain::{IngestConfig, Stage};
use corpusmem_core::engine::Engine;
use corpusmem_core::pipeline;
use corpusmem_core::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn empty_input_emits_single_preparation_event_and_closes_both_streams() {
  let engine = Arc::new(Engine::new(
    Arc::new(FakeCompletions::with_facts(vec![])),
    Arc::new(FakeEmbeddings::default()),
    Arc::new(InMemoryStorage::new()),
  ));

  let (mut progress_rx, mut error_rx) = pipeline::store(engine, Vec::new(), IngestConfig::default(), CancellationToken::new());

  let first = progress_rx.recv().await.expect("expected one progress event");
  assert_eq!(first.processed, 0);
  assert_eq!(first.total, 0);
  assert_eq!(first.stage, Stage::Preparation);

  assert!(progress_rx.recv().await.is_none());
  assert!(error_rx.recv().await.is_none());
}
