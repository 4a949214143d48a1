//! Hand-written fakes for the engine's collaborator traits, used by this
//! crate's own test suite and by integration tests under `tests/`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use corpusmem_ai::{ActionChoice, CandidateFact, CompletionsService, ConsolidationOutput, EmbeddingsService, ExtractFactsOutput};
use corpusmem_shared::{AppError, Document};
use uuid::Uuid;

use crate::domain::{ExistingMemory, MemoryFact};
use crate::storage::{DocumentReference, Filter, QueryResult, Storage};

/// Always extracts a single fixed fact, or replays a scripted sequence.
pub struct FakeCompletions {
  pub facts: Vec<String>,
  pub action: Mutex<Option<ActionChoice>>,
}

impl FakeCompletions {
  #[must_use]
  pub fn with_facts(facts: Vec<String>) -> Self {
    Self {
      facts,
      action: Mutex::new(None),
    }
  }

  #[must_use]
  pub fn always_choosing(action: ActionChoice) -> Self {
    Self {
      facts: Vec::new(),
      action: Mutex::new(Some(action)),
    }
  }
}

#[async_trait]
impl CompletionsService for FakeCompletions {
  async fn extract_facts(&self, _document_content: &str, _speaker: &str) -> Result<ExtractFactsOutput, AppError> {
    Ok(ExtractFactsOutput {
      facts: self.facts.clone(),
    })
  }

  async fn decide_action(&self, _new_fact: &str, _candidates: &[CandidateFact]) -> Result<ActionChoice, AppError> {
    let guard = self.action.lock().expect("lock poisoned");
    Ok(guard.clone().unwrap_or(ActionChoice::Add {
      reason: "fake default".to_owned(),
    }))
  }

  async fn consolidate(
    &self,
    facts: &[(usize, String)],
    _topic_hint: Option<&str>,
  ) -> Result<ConsolidationOutput, AppError> {
    Ok(ConsolidationOutput {
      consolidated: facts
        .iter()
        .map(|(index, content)| corpusmem_ai::ConsolidatedFactOut {
          content: content.clone(),
          source_indices: vec![*index],
          topic: "fake".to_owned(),
        })
        .collect(),
    })
  }
}

/// Returns a fixed-length zero vector for every input, deterministic and
/// allocation-cheap for tests.
pub struct FakeEmbeddings {
  pub dim: usize,
}

impl Default for FakeEmbeddings {
  fn default() -> Self {
    Self { dim: 8 }
  }
}

#[async_trait]
impl EmbeddingsService for FakeEmbeddings {
  async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
    Ok(vec![0.0; self.dim])
  }

  async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
    Ok(texts.iter().map(|_| vec![0.0; self.dim]).collect())
  }
}

/// In-memory `Storage` fake, standing in for Postgres/pgvector in tests.
#[derive(Default)]
pub struct InMemoryStorage {
  facts: Mutex<HashMap<Uuid, MemoryFact>>,
  documents: Mutex<HashMap<Uuid, Document>>,
}

impl InMemoryStorage {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn seed_fact(&self, fact: MemoryFact) {
    self.facts.lock().expect("lock poisoned").insert(fact.id, fact);
  }

  #[must_use]
  pub fn fact_count(&self) -> usize {
    self.facts.lock().expect("lock poisoned").len()
  }
}

#[async_trait]
impl Storage for InMemoryStorage {
  async fn query(&self, _text: &str, filter: Option<&Filter>) -> Result<QueryResult, AppError> {
    let facts = self.facts.lock().expect("lock poisoned");
    let limit = filter.and_then(|f| f.limit).unwrap_or(facts.len());
    let result = facts
      .values()
      .take(limit)
      .map(|f| ExistingMemory {
        id: f.id,
        content: f.content.clone(),
        timestamp: f.timestamp,
        score: 0.0,
        metadata: f.metadata.clone(),
      })
      .collect();
    Ok(QueryResult {
      facts: result,
      documents: Vec::new(),
    })
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryFact>, AppError> {
    Ok(self.facts.lock().expect("lock poisoned").get(&id).cloned())
  }

  async fn update(&self, id: Uuid, content: &str, vector: Vec<f32>) -> Result<(), AppError> {
    let mut facts = self.facts.lock().expect("lock poisoned");
    if let Some(fact) = facts.get_mut(&id) {
      fact.content = content.to_owned();
      fact.embedding = vector;
    }
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> Result<(), AppError> {
    self.facts.lock().expect("lock poisoned").remove(&id);
    Ok(())
  }

  async fn store_batch(&self, objects: &[MemoryFact]) -> Result<(), AppError> {
    let mut facts = self.facts.lock().expect("lock poisoned");
    for object in objects {
      facts.insert(object.id, object.clone());
    }
    Ok(())
  }

  async fn delete_all(&self) -> Result<(), AppError> {
    self.facts.lock().expect("lock poisoned").clear();
    Ok(())
  }

  async fn ensure_schema_exists(&self) -> Result<(), AppError> {
    Ok(())
  }

  async fn upsert_document(&self, document: &Document) -> Result<Uuid, AppError> {
    self
      .documents
      .lock()
      .expect("lock poisoned")
      .insert(document.id, document.clone());
    Ok(document.id)
  }

  async fn get_stored_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
    Ok(self.documents.lock().expect("lock poisoned").get(&id).cloned())
  }

  async fn get_stored_documents_batch(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
    let documents = self.documents.lock().expect("lock poisoned");
    Ok(ids.iter().filter_map(|id| documents.get(id).cloned()).collect())
  }

  async fn get_facts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MemoryFact>, AppError> {
    let facts = self.facts.lock().expect("lock poisoned");
    Ok(ids.iter().filter_map(|id| facts.get(id).cloned()).collect())
  }

  async fn get_document_references(&self, memory_id: Uuid) -> Result<Vec<DocumentReference>, AppError> {
    let facts = self.facts.lock().expect("lock poisoned");
    Ok(facts.get(&memory_id).map_or_else(Vec::new, |fact| {
      fact
        .document_references
        .iter()
        .map(|id| DocumentReference {
          document_id: *id,
          source: fact.source.clone(),
        })
        .collect()
    }))
  }
}
