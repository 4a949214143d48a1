use std::sync::Arc;

use corpusmem_core::domain::{IngestConfig, Stage};
use corpusmem_core::engine::Engine;
use corpusmem_core::pipeline;
use corpusmem_core::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};
use corpusmem_shared::Document;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn single_text_document_is_added_with_document_level_speaker_and_reference() {
  let completions = Arc::new(FakeCompletions::with_facts(vec!["user likes pizza".to_owned()]));
  let storage = Arc::new(InMemoryStorage::new());
  let engine = Arc::new(Engine::new(completions, Arc::new(FakeEmbeddings::default()), Arc::clone(&storage) as Arc<dyn corpusmem_core::Storage>));

  let docs = vec![Document::new_text("notes", "Alice likes pizza")];
  let mut config = IngestConfig::default();
  config.per_speaker_expansion = false;

  let (mut progress_rx, mut error_rx) = pipeline::store(engine, docs, config, CancellationToken::new());

  let mut last_stage = None;
  while let Some(progress) = progress_rx.recv().await {
    last_stage = Some(progress.stage);
  }
  assert_eq!(last_stage, Some(Stage::Completed));
  assert!(error_rx.recv().await.is_none());

  assert_eq!(storage.fact_count(), 1);
}

#[tokio::test]
async fn decode_failure_falls_back_to_add() {
  // A decision call that never returns a scripted action defaults to ADD,
  // per the engine's conservative default policy.
  let completions = Arc::new(FakeCompletions::with_facts(vec!["some fact".to_owned()]));
  let storage = Arc::new(InMemoryStorage::new());
  let engine = Arc::new(Engine::new(completions, Arc::new(FakeEmbeddings::default()), Arc::clone(&storage) as Arc<dyn corpusmem_core::Storage>));

  let docs = vec![Document::new_text("notes", "something happened")];
  let (mut progress_rx, mut error_rx) = pipeline::store(engine, docs, IngestConfig::default(), CancellationToken::new());

  while progress_rx.recv().await.is_some() {}
  assert!(error_rx.recv().await.is_none());
  assert_eq!(storage.fact_count(), 1);
}
