use async_trait::async_trait;
use corpusmem_shared::{AppError, Document};
use uuid::Uuid;

use crate::domain::{ExistingMemory, MemoryFact};

/// Tag-matching mode for [`Filter::tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
  All,
  Any,
}

/// Query constraints accepted by [`Storage::query`].
#[derive(Debug, Clone, Default)]
pub struct Filter {
  pub source: Option<String>,
  pub contact_name: Option<String>,
  pub fact_category: Option<String>,
  pub tags: Option<(TagMatch, Vec<String>)>,
  /// Cosine distance cap in `(0, 1]`; `0` means "use the default".
  pub distance: f64,
  /// `None` means "use the default".
  pub limit: Option<usize>,
}

pub struct QueryResult {
  pub facts: Vec<ExistingMemory>,
  pub documents: Vec<Document>,
}

/// A reference from a stored fact back to one of its source documents.
pub struct DocumentReference {
  pub document_id: Uuid,
  pub source: String,
}

/// Narrow persistence interface the engine and pipeline depend on. Concrete
/// implementations (Postgres/pgvector, an in-memory fake for tests) live
/// outside this crate so the engine never touches a vendor client directly.
#[async_trait]
pub trait Storage: Send + Sync {
  async fn query(&self, text: &str, filter: Option<&Filter>) -> Result<QueryResult, AppError>;

  async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryFact>, AppError>;

  async fn update(&self, id: Uuid, content: &str, vector: Vec<f32>) -> Result<(), AppError>;

  async fn delete(&self, id: Uuid) -> Result<(), AppError>;

  async fn store_batch(&self, objects: &[MemoryFact]) -> Result<(), AppError>;

  async fn delete_all(&self) -> Result<(), AppError>;

  async fn ensure_schema_exists(&self) -> Result<(), AppError>;

  async fn upsert_document(&self, document: &Document) -> Result<Uuid, AppError>;

  async fn get_stored_document(&self, id: Uuid) -> Result<Option<Document>, AppError>;

  async fn get_stored_documents_batch(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError>;

  async fn get_facts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MemoryFact>, AppError>;

  async fn get_document_references(&self, memory_id: Uuid) -> Result<Vec<DocumentReference>, AppError>;
}
