use std::sync::Arc;

use corpusmem_core::domain::IngestConfig;
use corpusmem_core::engine::Engine;
use corpusmem_core::pipeline;
use corpusmem_core::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};
use corpusmem_shared::Document;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn cancelling_before_extraction_surfaces_an_error_and_closes_both_streams() {
  let engine = Arc::new(Engine::new(
    Arc::new(FakeCompletions::with_facts(vec!["a fact".to_owned()])),
    Arc::new(FakeEmbeddings::default()),
    Arc::new(InMemoryStorage::new()),
  ));

  let cancel = CancellationToken::new();
  cancel.cancel();

  let docs = vec![Document::new_text("notes", "some content")];
  let (mut progress_rx, mut error_rx) = pipeline::store(engine, docs, IngestConfig::default(), cancel);

  while progress_rx.recv().await.is_some() {}
  let error = error_rx.recv().await;
  assert!(error.is_some(), "a cancelled run must surface at least one error");
  assert!(error_rx.recv().await.is_none());
}
