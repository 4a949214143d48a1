use std::collections::HashMap;
use std::str::FromStr;

use corpusmem_core::{MemoryFact, Sensitivity};
use corpusmem_entities::document;
use corpusmem_entities::memory_fact;
use corpusmem_shared::{Document, DocumentKind};
use sea_orm::prelude::PgVector;

pub fn fact_to_model(fact: &MemoryFact) -> memory_fact::Model {
  memory_fact::Model {
    id: fact.id,
    content: fact.content.clone(),
    category: fact.category.clone(),
    subject: fact.subject.clone(),
    attribute: fact.attribute.clone(),
    value: fact.value.clone(),
    temporal_context: fact.temporal_context.clone(),
    importance: fact.importance,
    sensitivity: fact.sensitivity.to_string(),
    source: fact.source.clone(),
    timestamp: fact.timestamp.into(),
    tags: serde_json::to_value(&fact.tags).unwrap_or_default(),
    metadata: serde_json::to_value(&fact.metadata).unwrap_or_default(),
    document_references: fact.document_references.clone(),
    embedding: PgVector::from(fact.embedding.clone()),
    created_at: fact.timestamp.into(),
  }
}

pub fn model_to_fact(model: memory_fact::Model) -> MemoryFact {
  let tags: Vec<String> = serde_json::from_value(model.tags).unwrap_or_default();
  let metadata: HashMap<String, String> = serde_json::from_value(model.metadata).unwrap_or_default();
  let sensitivity = Sensitivity::from_str(&model.sensitivity).unwrap_or(Sensitivity::Low);

  MemoryFact {
    id: model.id,
    content: model.content,
    category: model.category,
    subject: model.subject,
    attribute: model.attribute,
    value: model.value,
    temporal_context: model.temporal_context,
    importance: model.importance,
    sensitivity,
    source: model.source,
    timestamp: model.timestamp.with_timezone(&chrono::Utc),
    tags,
    metadata,
    document_references: model.document_references,
    embedding: model.embedding.as_slice().to_vec(),
  }
}

pub fn document_to_model(document: &Document) -> document::Model {
  let kind = match &document.kind {
    DocumentKind::Conversation { .. } => "conversation",
    DocumentKind::Text { .. } => "text",
  };

  document::Model {
    id: document.id,
    source: document.source.clone(),
    timestamp: document.timestamp.map(Into::into),
    tags: serde_json::to_value(&document.tags).unwrap_or_default(),
    metadata: serde_json::to_value(&document.metadata).unwrap_or_default(),
    kind: Some(kind.to_owned()),
    body: serde_json::to_value(&document.kind).unwrap_or_default(),
    created_at: Some(chrono::Utc::now().into()),
  }
}

pub fn model_to_document(model: document::Model) -> Option<Document> {
  let kind: DocumentKind = serde_json::from_value(model.body).ok()?;
  Some(Document {
    id: model.id,
    source: model.source,
    timestamp: model.timestamp.map(|t| t.with_timezone(&chrono::Utc)),
    tags: serde_json::from_value(model.tags).unwrap_or_default(),
    metadata: serde_json::from_value(model.metadata).unwrap_or_default(),
    kind,
  })
}
