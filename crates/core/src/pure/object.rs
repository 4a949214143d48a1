use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ExtractedFact, MemoryFact, Sensitivity};

/// Construct a stored-fact record from an extracted fact and its decision
/// context. The vector field is left empty; the engine fills it in after
/// computing an embedding.
#[must_use]
pub fn create_memory_object_with_document_references(
  fact: &ExtractedFact,
  document_ids: Vec<Uuid>,
) -> MemoryFact {
  let mut metadata = fact.source.document.metadata.clone();
  if !fact.speaker_id.is_empty() {
    metadata.insert("speakerID".to_owned(), fact.speaker_id.clone());
  }

  let mut tags = fact.source.document.tags.clone();
  tags.push("fact".to_owned());

  let timestamp: DateTime<Utc> = fact.source.timestamp;

  MemoryFact {
    id: Uuid::now_v7(),
    content: fact.content.clone(),
    category: "general".to_owned(),
    subject: if fact.speaker_id.is_empty() {
      "document".to_owned()
    } else {
      fact.speaker_id.clone()
    },
    attribute: String::new(),
    value: fact.content.clone(),
    temporal_context: None,
    importance: 5,
    sensitivity: Sensitivity::Low,
    source: fact.source.document.source.clone(),
    timestamp,
    tags,
    metadata,
    document_references: document_ids,
    embedding: Vec::new(),
  }
}

/// Split `objects` into contiguous batches of at most `size`; the final batch
/// may be short. Order is preserved.
#[must_use]
pub fn batch_objects<T>(objects: Vec<T>, size: usize) -> Vec<Vec<T>> {
  if size == 0 || objects.is_empty() {
    return if objects.is_empty() { Vec::new() } else { vec![objects] };
  }

  let mut batches = Vec::new();
  let mut current = Vec::with_capacity(size);
  for object in objects {
    current.push(object);
    if current.len() == size {
      batches.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
    }
  }
  if !current.is_empty() {
    batches.push(current);
  }
  batches
}
