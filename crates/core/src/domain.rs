use std::collections::HashMap;

use chrono::{DateTime, Utc};
use corpusmem_shared::{AppError, Document};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// How sensitive a stored fact is, for downstream access control decisions
/// outside the scope of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
  Low,
  Medium,
  High,
}

/// A `Document` after preparation: timestamps resolved, type classified, and
/// (for conversations) possibly expanded to one unit per speaker.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
  pub document: Document,
  /// "" means document-level context (not attributed to one participant).
  pub speaker_id: String,
  pub timestamp: DateTime<Utc>,
  /// `YYYY-MM-DD`, pre-formatted for prompt construction.
  pub date_string: String,
}

/// A fact pulled out of a document by the extraction step, not yet decided on.
#[derive(Debug, Clone)]
pub struct ExtractedFact {
  pub content: String,
  pub speaker_id: String,
  pub source: PreparedDocument,
}

/// The outcome of a memory-update decision for a single extracted fact.
#[derive(Debug, Clone)]
pub struct MemoryDecision {
  pub action: DecisionAction,
  /// Required for Update/Delete.
  pub target_id: Option<Uuid>,
  /// The replacement content for Update; unused otherwise.
  pub new_content: Option<String>,
  pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
  Add,
  Update,
  Delete,
  None,
}

/// A fact retrieved from storage as a similarity-search candidate.
#[derive(Debug, Clone)]
pub struct ExistingMemory {
  pub id: Uuid,
  pub content: String,
  pub timestamp: DateTime<Utc>,
  /// Distance from the query; smaller is closer.
  pub score: f64,
  /// Carries `"speakerID"` when the fact is speaker-scoped.
  pub metadata: HashMap<String, String>,
}

impl ExistingMemory {
  #[must_use]
  pub fn speaker_id(&self) -> Option<&str> {
    self.metadata.get("speakerID").map(String::as_str)
  }
}

/// A persisted memory fact: the content-addressable unit of the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemoryFact {
  pub id: Uuid,
  pub content: String,

  pub category: String,
  pub subject: String,
  pub attribute: String,
  pub value: String,
  pub temporal_context: Option<String>,

  pub importance: i32,
  pub sensitivity: Sensitivity,

  pub source: String,
  pub timestamp: DateTime<Utc>,

  pub tags: Vec<String>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
  pub document_references: Vec<Uuid>,

  #[serde(skip)]
  pub embedding: Vec<f32>,
}

/// Outcome of processing a single extracted fact through the engine.
pub struct FactResult {
  pub fact: ExtractedFact,
  pub decision: MemoryDecision,
  /// Present iff `decision.action == Add` and object creation succeeded.
  pub object: Option<MemoryFact>,
  pub error: Option<AppError>,
}

/// Per-`Store` call configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
  pub workers: usize,
  pub batch_size: usize,
  pub flush_interval: std::time::Duration,
  pub fact_extraction_timeout: std::time::Duration,
  pub memory_decision_timeout: std::time::Duration,
  pub storage_timeout: std::time::Duration,
  /// When true, a conversation document is expanded to one `PreparedDocument`
  /// per distinct participant instead of a single document-level unit.
  pub per_speaker_expansion: bool,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      workers: 4,
      batch_size: 20,
      flush_interval: std::time::Duration::from_millis(500),
      fact_extraction_timeout: std::time::Duration::from_secs(30),
      memory_decision_timeout: std::time::Duration::from_secs(30),
      storage_timeout: std::time::Duration::from_secs(10),
      per_speaker_expansion: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Preparation,
  FactExtraction,
  FactProcessing,
  Aggregation,
  Storage,
  Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Progress {
  pub processed: usize,
  pub total: usize,
  pub stage: Stage,
}

/// A fact synthesized by consolidation from one or more source facts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsolidatedFact {
  pub fact: MemoryFact,
  pub consolidated_from: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsolidationReport {
  pub topic: String,
  pub summary: String,
  pub consolidated_facts: Vec<ConsolidatedFact>,
  pub source_fact_count: usize,
  pub generated_at: DateTime<Utc>,
}

/// Selection strategy for which existing facts feed a consolidation run.
pub enum ConsolidationQuery {
  Tag(Vec<String>),
  Category(String),
  Semantic { query: String, distance: Option<f64>, limit: Option<usize> },
}
