use std::sync::Arc;

use axum::http::StatusCode;
use corpusmem_ai::{ActionChoice, CandidateFact, CompletionsService, EmbeddingsService};
use corpusmem_shared::AppError;
use uuid::Uuid;

use crate::domain::{DecisionAction, ExistingMemory, ExtractedFact, FactResult, MemoryDecision, MemoryFact};
use crate::pure::{create_memory_object_with_document_references, validate_memory_operation};
use crate::storage::{Filter, Storage};

/// Broad default distance cap for similarity search (cosine).
const DEFAULT_SEARCH_DISTANCE: f64 = 0.8;
/// Bounded default result count for similarity search.
const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Stateless per-fact decision engine. Holds only injected collaborator
/// handles; all durable state lives in storage.
pub struct Engine {
  completions: Arc<dyn CompletionsService>,
  embeddings: Arc<dyn EmbeddingsService>,
  storage: Arc<dyn Storage>,
}

impl Engine {
  #[must_use]
  pub fn new(
    completions: Arc<dyn CompletionsService>,
    embeddings: Arc<dyn EmbeddingsService>,
    storage: Arc<dyn Storage>,
  ) -> Self {
    Self {
      completions,
      embeddings,
      storage,
    }
  }

  /// Extract discrete facts from a prepared document's content.
  pub async fn extract_facts(&self, content: &str, speaker_id: &str) -> Result<Vec<String>, AppError> {
    let speaker = if speaker_id.is_empty() { "document" } else { speaker_id };
    match self.completions.extract_facts(content, speaker).await {
      Ok(output) => Ok(output.facts),
      Err(err) if err.status_code() == StatusCode::UNPROCESSABLE_ENTITY => {
        tracing::warn!(%err, "fact extraction returned no usable tool call, yielding no facts");
        Ok(Vec::new())
      }
      Err(err) => Err(err),
    }
  }

  /// Decide how `fact` should affect the memory store, given its nearest
  /// neighbors. A decode failure is treated as ADD (conservative default).
  pub async fn decide_action(&self, fact: &str, similar: &[ExistingMemory]) -> Result<MemoryDecision, AppError> {
    let candidates: Vec<CandidateFact> = similar
      .iter()
      .map(|m| CandidateFact {
        id: m.id,
        content: m.content.clone(),
      })
      .collect();

    let choice = match self.completions.decide_action(fact, &candidates).await {
      Ok(choice) => choice,
      Err(err) if err.status_code() == StatusCode::UNPROCESSABLE_ENTITY => {
        tracing::warn!(%err, "memory decision produced no tool call, defaulting to ADD");
        ActionChoice::Add {
          reason: "no decision returned, defaulting to add".to_owned(),
        }
      }
      Err(err) => return Err(err),
    };

    Ok(match choice {
      ActionChoice::Add { reason } => MemoryDecision {
        action: DecisionAction::Add,
        target_id: None,
        new_content: None,
        reason,
      },
      ActionChoice::Update { fact_id, content, reason } => MemoryDecision {
        action: DecisionAction::Update,
        target_id: Some(fact_id),
        new_content: Some(content),
        reason,
      },
      ActionChoice::Delete { fact_id, reason } => MemoryDecision {
        action: DecisionAction::Delete,
        target_id: Some(fact_id),
        new_content: None,
        reason,
      },
      ActionChoice::None { reason } => MemoryDecision {
        action: DecisionAction::None,
        target_id: None,
        new_content: None,
        reason,
      },
    })
  }

  /// Semantic nearest-neighbor search over the store, scoped to `speaker_id`
  /// when non-empty.
  pub async fn search_similar(&self, fact: &str, speaker_id: &str) -> Result<Vec<ExistingMemory>, AppError> {
    let filter = Filter {
      distance: DEFAULT_SEARCH_DISTANCE,
      limit: Some(DEFAULT_SEARCH_LIMIT),
      contact_name: if speaker_id.is_empty() {
        None
      } else {
        Some(speaker_id.to_owned())
      },
      ..Filter::default()
    };

    let result = self.storage.query(fact, Some(&filter)).await?;
    Ok(result.facts)
  }

  pub async fn update_memory(&self, id: Uuid, content: &str, vector: Vec<f32>) -> Result<(), AppError> {
    self.storage.update(id, content, vector).await
  }

  pub async fn delete_memory(&self, id: Uuid) -> Result<(), AppError> {
    self.storage.delete(id).await
  }

  pub async fn store_batch(&self, objects: &[MemoryFact]) -> Result<(), AppError> {
    self.storage.store_batch(objects).await
  }

  /// Persist the source document (if not already known), synthesize the
  /// fact record, and attach its embedding.
  pub async fn create_memory_object(&self, fact: &ExtractedFact) -> Result<MemoryFact, AppError> {
    let document_id = self.storage.upsert_document(&fact.source.document).await?;
    let mut object = create_memory_object_with_document_references(fact, vec![document_id]);
    object.embedding = self.embeddings.embed(&fact.content).await?;
    Ok(object)
  }

  /// Compose the five-step per-fact pipeline: search, decide, validate
  /// (for UPDATE/DELETE), execute, and always return a `FactResult` — never
  /// a raw error that could poison sibling facts.
  pub async fn process_fact(&self, fact: ExtractedFact) -> FactResult {
    let similar = match self.search_similar(&fact.content, &fact.speaker_id).await {
      Ok(similar) => similar,
      Err(err) => {
        return FactResult {
          fact,
          decision: MemoryDecision {
            action: DecisionAction::None,
            target_id: None,
            new_content: None,
            reason: "search failed".to_owned(),
          },
          object: None,
          error: Some(err),
        };
      }
    };

    let decision = match self.decide_action(&fact.content, &similar).await {
      Ok(decision) => decision,
      Err(err) => {
        return FactResult {
          fact,
          decision: MemoryDecision {
            action: DecisionAction::None,
            target_id: None,
            new_content: None,
            reason: "decision failed".to_owned(),
          },
          object: None,
          error: Some(err),
        };
      }
    };

    if matches!(decision.action, DecisionAction::Update | DecisionAction::Delete) {
      let Some(target_id) = decision.target_id else {
        return FactResult {
          fact,
          object: None,
          error: Some(AppError::new(anyhow::anyhow!("decision missing target_id"))),
          decision,
        };
      };

      let Some(target) = similar.iter().find(|m| m.id == target_id) else {
        return FactResult {
          fact,
          object: None,
          error: Some(AppError::new(anyhow::anyhow!("target memory not found: {target_id}"))),
          decision,
        };
      };

      if let Err(err) = validate_memory_operation(&fact.speaker_id, target) {
        return FactResult {
          fact,
          object: None,
          error: Some(err),
          decision,
        };
      }
    }

    match decision.action {
      DecisionAction::Add => match self.create_memory_object(&fact).await {
        Ok(object) => FactResult {
          fact,
          decision,
          object: Some(object),
          error: None,
        },
        Err(err) => FactResult {
          fact,
          decision,
          object: None,
          error: Some(err),
        },
      },
      DecisionAction::Update => {
        let target_id = decision.target_id.expect("validated above");
        let new_content = decision.new_content.clone().unwrap_or_else(|| fact.content.clone());
        let vector = match self.embeddings.embed(&new_content).await {
          Ok(v) => v,
          Err(err) => {
            return FactResult {
              fact,
              decision,
              object: None,
              error: Some(err),
            };
          }
        };
        let error = self.update_memory(target_id, &new_content, vector).await.err();
        FactResult {
          fact,
          decision,
          object: None,
          error,
        }
      }
      DecisionAction::Delete => {
        let target_id = decision.target_id.expect("validated above");
        let error = self.delete_memory(target_id).await.err();
        FactResult {
          fact,
          decision,
          object: None,
          error,
        }
      }
      DecisionAction::None => FactResult {
        fact,
        decision,
        object: None,
        error: None,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::sync::Arc;

  use chrono::Utc;
  use corpusmem_ai::ActionChoice;
  use corpusmem_shared::Document;

  use super::*;
  use crate::domain::PreparedDocument;
  use crate::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};

  fn extracted_fact(content: &str, speaker_id: &str) -> ExtractedFact {
    ExtractedFact {
      content: content.to_owned(),
      speaker_id: speaker_id.to_owned(),
      source: PreparedDocument {
        document: Document::new_text("notes", content),
        speaker_id: speaker_id.to_owned(),
        timestamp: Utc::now(),
        date_string: "2026-01-01".to_owned(),
      },
    }
  }

  fn engine_with(completions: FakeCompletions, storage: InMemoryStorage) -> Engine {
    Engine::new(Arc::new(completions), Arc::new(FakeEmbeddings::default()), Arc::new(storage))
  }

  #[tokio::test]
  async fn add_path_creates_object_and_no_error() {
    let engine = engine_with(FakeCompletions::always_choosing(ActionChoice::Add {
      reason: "new".to_owned(),
    }), InMemoryStorage::new());

    let result = engine.process_fact(extracted_fact("user likes pizza", "user")).await;

    assert!(result.error.is_none());
    assert!(result.object.is_some());
    assert_eq!(result.object.unwrap().document_references.len(), 1);
  }

  #[tokio::test]
  async fn update_path_rewrites_target_content() {
    let storage = InMemoryStorage::new();
    let target_id = Uuid::now_v7();
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
      sensitivity: crate::domain::Sensitivity::Low,
      source: "notes".to_owned(),
      timestamp: Utc::now(),
      tags: vec![],
      metadata,
      document_references: vec![],
      embedding: vec![0.0; 8],
    });

    let engine = engine_with(
      FakeCompletions::always_choosing(ActionChoice::Update {
        fact_id: target_id,
        content: "User prefers veggie pizza".to_owned(),
        reason: "preference changed".to_owned(),
      }),
      storage,
    );

    let result = engine.process_fact(extracted_fact("User now prefers veggie pizza", "user")).await;

    assert!(result.error.is_none());
    assert!(result.object.is_none());
    assert_eq!(result.decision.target_id, Some(target_id));
  }

  #[tokio::test]
  async fn document_level_update_of_speaker_scoped_target_is_rejected() {
    let storage = InMemoryStorage::new();
    let target_id = Uuid::now_v7();
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
      sensitivity: crate::domain::Sensitivity::Low,
      source: "notes".to_owned(),
      timestamp: Utc::now(),
      tags: vec![],
      metadata,
      document_references: vec![],
      embedding: vec![0.0; 8],
    });

    let engine = engine_with(
      FakeCompletions::always_choosing(ActionChoice::Update {
        fact_id: target_id,
        content: "Alice lives in Osaka now".to_owned(),
        reason: "moved".to_owned(),
      }),
      storage,
    );

    let result = engine.process_fact(extracted_fact("Alice moved", "")).await;

    assert!(result.error.is_some());
    assert!(result.object.is_none());
  }
}
