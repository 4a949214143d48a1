use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use corpusmem_ai::ActionChoice;
use corpusmem_core::domain::{MemoryFact, Sensitivity};
use corpusmem_core::engine::Engine;
use corpusmem_core::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};
use corpusmem_shared::Document;
use uuid::Uuid;

/// This exercises the engine directly rather than through the pipeline: a
/// per-fact ValidationError must never surface as a process-killing error,
/// only as `FactResult.error`, so the engine call is the right granularity
/// to assert on.
#[tokio::test]
async fn document_level_fact_cannot_update_a_speaker_scoped_target() {
  let target_id = Uuid::now_v7();
  let storage = InMemoryStorage::new();
  let mut metadata = HashMap::new();
  metadata.insert("speakerID".to_owned(), "alice".to_owned());
  storage.seed_fact(MemoryFact {
    id: target_id,
    content: "Alice lives in Tokyo".to_owned(),
    category: "general".to_owned(),
    subject: "alice".to_owned(),
    attribute: String::new(),
    value: "Alice lives in Tokyo".to_owned(),
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

  let engine = Engine::new(
    Arc::new(FakeCompletions::always_choosing(ActionChoice::Update {
      fact_id: target_id,
      content: "Alice lives in Osaka now".to_owned(),
      reason: "moved".to_owned(),
    })),
    Arc::new(FakeEmbeddings::default()),
    Arc::new(storage),
  );

  let fact = corpusmem_core::domain::ExtractedFact {
    content: "Alice moved to Osaka".to_owned(),
    speaker_id: String::new(),
    source: corpusmem_core::domain::PreparedDocument {
      document: Document::new_text("notes", "Alice moved to Osaka"),
      speaker_id: String::new(),
      timestamp: Utc::now(),
      date_string: "2026-01-01".to_owned(),
    },
  };

  let result = engine.process_fact(fact).await;

  assert!(result.error.is_some(), "document-level update of a speaker-scoped fact must be rejected");
  assert!(result.object.is_none());
}
