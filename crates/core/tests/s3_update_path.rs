use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use corpusmem_ai::ActionChoice;
use corpusmem_core::domain::{IngestConfig, MemoryFact, Sensitivity};
use corpusmem_core::engine::Engine;
use corpusmem_core::pipeline;
use corpusmem_core::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};
use corpusmem_core::Storage as _;
use corpusmem_shared::Document;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[tokio::test]
async fn update_decision_rewrites_target_and_produces_no_add_batch() {
  let target_id = Uuid::now_v7();
  let storage = Arc::new(InMemoryStorage::new());
  let mut metadata = HashMap::new();
  metadata.insert("speakerID".to_owned(), "user".to_owned());
  storage.seed_fact(MemoryFact {
    id: target_id,
    content: "User likes cheese pizza".to_owned(),
    category: "general".to_owned(),
    subject: "user".to_owned(),
    attribute: String::new(),
    value: "User likes cheese pizza".to_owned(),
    temporal_context: None,
    importance: 5,
    sensitivity: Sensitivity::Low,
    source: "notes".to_owned(),
    timestamp: Utc::now(),
    tags: vec![],
    metadata,
    document_references: vec![],
    embedding: vec![0.0; 8],
  });

  let completions = Arc::new(FakeCompletions::with_facts(vec!["User now prefers veggie pizza".to_owned()]));
  *completions.action.lock().unwrap() = Some(ActionChoice::Update {
    fact_id: target_id,
    content: "User prefers veggie pizza".to_owned(),
    reason: "preference changed".to_owned(),
  });

  let engine = Arc::new(Engine::new(
    completions,
    Arc::new(FakeEmbeddings::default()),
    Arc::clone(&storage) as Arc<dyn corpusmem_core::Storage>,
  ));

  let docs = vec![Document::new_text("notes", "User now prefers veggie pizza")];
  let (mut progress_rx, mut error_rx) = pipeline::store(engine, docs, IngestConfig::default(), CancellationToken::new());

  while progress_rx.recv().await.is_some() {}
  assert!(error_rx.recv().await.is_none());

  assert_eq!(storage.fact_count(), 1);
  let updated = storage.get_by_id(target_id).await.unwrap().expect("target fact still present");
  assert_eq!(updated.content, "User prefers veggie pizza");
  assert_eq!(updated.id, target_id);
}
