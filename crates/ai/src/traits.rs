use async_trait::async_trait;
use corpusmem_shared::AppError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Facts an extraction pass pulled out of a document, as plain natural
/// language statements. The engine turns each one into its own pipeline item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractFactsOutput {
  pub facts: Vec<String>,
}

/// A memory fact already on file, offered to the model as an update/delete
/// candidate. Lives here rather than in `corpusmem_core` so this crate has
/// no dependency on the pipeline crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFact {
  pub id: Uuid,
  pub content: String,
}

/// The four mutually exclusive outcomes of a memory-update decision.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionChoice {
  Add { reason: String },
  Update { fact_id: Uuid, content: String, reason: String },
  Delete { fact_id: Uuid, reason: String },
  None { reason: String },
}

/// One fact produced by merging a set of related source facts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsolidatedFactOut {
  pub content: String,
  /// 1-based indices into the enumerated prompt, identifying which source
  /// facts this consolidated fact was synthesized from.
  pub source_indices: Vec<usize>,
  pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsolidationOutput {
  pub consolidated: Vec<ConsolidatedFactOut>,
}

/// Narrow interface over the chat-completions vendor, so the pipeline can be
/// exercised against a fake in tests instead of a live OpenAI endpoint.
#[async_trait]
pub trait CompletionsService: Send + Sync {
  async fn extract_facts(&self, document_content: &str, speaker: &str) -> Result<ExtractFactsOutput, AppError>;

  async fn decide_action(
    &self,
    new_fact: &str,
    candidates: &[CandidateFact],
  ) -> Result<ActionChoice, AppError>;

  async fn consolidate(
    &self,
    facts: &[(usize, String)],
    topic_hint: Option<&str>,
  ) -> Result<ConsolidationOutput, AppError>;
}

/// Narrow interface over the embeddings vendor.
#[async_trait]
pub trait EmbeddingsService: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

  async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}
