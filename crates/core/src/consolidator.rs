use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Utc;
use corpusmem_ai::{CompletionsService, EmbeddingsService};
use corpusmem_shared::AppError;
use uuid::Uuid;

use crate::domain::{ConsolidatedFact, ConsolidationQuery, ConsolidationReport, MemoryFact, Sensitivity};
use crate::storage::{Filter, Storage, TagMatch};

/// Default result cap for each fetch strategy, absent a caller-supplied limit.
const DEFAULT_FETCH_LIMIT: usize = 50;

/// On-demand pass over existing facts: fetch by tag/category/similarity,
/// ask the LLM to synthesize higher-level facts, and optionally persist them
/// directly — bypassing the per-fact decision engine, since the content is
/// already final.
pub struct Consolidator {
  completions: Arc<dyn CompletionsService>,
  embeddings: Arc<dyn EmbeddingsService>,
  storage: Arc<dyn Storage>,
}

impl Consolidator {
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

  pub async fn consolidate_by_tag(&self, topic: &str, tags: Vec<String>, persist: bool) -> Result<ConsolidationReport, AppError> {
    self.consolidate(topic, ConsolidationQuery::Tag(tags), persist).await
  }

  pub async fn consolidate_by_category(&self, topic: &str, category: String, persist: bool) -> Result<ConsolidationReport, AppError> {
    self.consolidate(topic, ConsolidationQuery::Category(category), persist).await
  }

  pub async fn consolidate_by_semantic(
    &self,
    topic: &str,
    query: String,
    distance: Option<f64>,
    limit: Option<usize>,
    persist: bool,
  ) -> Result<ConsolidationReport, AppError> {
    self.consolidate(topic, ConsolidationQuery::Semantic { query, distance, limit }, persist).await
  }

  async fn consolidate(&self, topic: &str, query: ConsolidationQuery, persist: bool) -> Result<ConsolidationReport, AppError> {
    let candidates = self.fetch_candidates(&query).await?;

    if candidates.is_empty() {
      return Ok(ConsolidationReport {
        topic: topic.to_owned(),
        summary: "no candidate facts found for this consolidation query".to_owned(),
        consolidated_facts: Vec::new(),
        source_fact_count: 0,
        generated_at: Utc::now(),
      });
    }

    let numbered: Vec<(usize, String)> = candidates
      .iter()
      .enumerate()
      .map(|(i, fact)| (i + 1, render_candidate(fact)))
      .collect();

    let output = self.completions.consolidate(&numbered, Some(topic)).await?;

    tracing::info!(
      candidates = candidates.len(),
      consolidated = output.consolidated.len(),
      "memory consolidation completed"
    );

    let all_ids: Vec<Uuid> = candidates.iter().map(|f| f.id).collect();
    let mut consolidated_facts = Vec::with_capacity(output.consolidated.len());

    for entry in output.consolidated {
      let source_ids = translate_indices(&entry.source_indices, &candidates, &all_ids);
      let sources: Vec<&MemoryFact> = candidates.iter().filter(|f| source_ids.contains(&f.id)).collect();

      let importance = sources.iter().map(|f| f.importance).max().unwrap_or(5);
      let sensitivity = sources
        .iter()
        .map(|f| f.sensitivity)
        .max_by_key(sensitivity_rank)
        .unwrap_or(Sensitivity::Low);

      let embedding = self.embeddings.embed(&entry.content).await?;

      let fact = MemoryFact {
        id: Uuid::now_v7(),
        content: entry.content.clone(),
        category: sources.first().map_or_else(|| "general".to_owned(), |f| f.category.clone()),
        subject: sources.first().map_or_else(|| "document".to_owned(), |f| f.subject.clone()),
        attribute: String::new(),
        value: entry.content,
        temporal_context: None,
        importance,
        sensitivity,
        source: "consolidation".to_owned(),
        timestamp: Utc::now(),
        tags: vec!["consolidated".to_owned(), entry.topic.clone()],
        metadata: std::collections::HashMap::new(),
        document_references: Vec::new(),
        embedding,
      };

      consolidated_facts.push(ConsolidatedFact {
        fact,
        consolidated_from: source_ids,
      });
    }

    if persist {
      let objects: Vec<MemoryFact> = consolidated_facts.iter().map(|c| c.fact.clone()).collect();
      self.storage.store_batch(&objects).await?;
    }

    Ok(ConsolidationReport {
      topic: topic.to_owned(),
      summary: format!(
        "consolidated {} fact(s) from {} source fact(s)",
        consolidated_facts.len(),
        candidates.len()
      ),
      source_fact_count: candidates.len(),
      consolidated_facts,
      generated_at: Utc::now(),
    })
  }

  async fn fetch_candidates(&self, query: &ConsolidationQuery) -> Result<Vec<MemoryFact>, AppError> {
    let (text, filter) = match query {
      ConsolidationQuery::Tag(tags) => (
        String::new(),
        Filter {
          tags: Some((TagMatch::All, tags.clone())),
          limit: Some(DEFAULT_FETCH_LIMIT),
          ..Filter::default()
        },
      ),
      ConsolidationQuery::Category(category) => (
        String::new(),
        Filter {
          fact_category: Some(category.clone()),
          limit: Some(DEFAULT_FETCH_LIMIT),
          ..Filter::default()
        },
      ),
      ConsolidationQuery::Semantic { query, distance, limit } => (
        query.clone(),
        Filter {
          distance: distance.unwrap_or(0.0),
          limit: Some(limit.unwrap_or(DEFAULT_FETCH_LIMIT)),
          ..Filter::default()
        },
      ),
    };

    let result = self.storage.query(&text, Some(&filter)).await?;
    let ids: Vec<Uuid> = result.facts.iter().map(|f| f.id).collect();
    self.storage.get_facts_by_ids(&ids).await
  }
}

/// Write a [`ConsolidationReport`] to `path` as indented JSON.
pub fn export_report(report: &ConsolidationReport, path: &std::path::Path) -> Result<(), AppError> {
  let json = serde_json::to_string_pretty(report)?;
  std::fs::write(path, json)?;
  tracing::debug!(path = %path.display(), "exported consolidation report");
  Ok(())
}

fn sensitivity_rank(sensitivity: &Sensitivity) -> u8 {
  match sensitivity {
    Sensitivity::Low => 0,
    Sensitivity::Medium => 1,
    Sensitivity::High => 2,
  }
}

fn render_candidate(fact: &MemoryFact) -> String {
  let mut line = String::new();
  let _ = write!(
    line,
    "[{}] {} - {}: {} [Importance: {}, Sensitivity: {}]",
    fact.category, fact.subject, fact.attribute, fact.value, fact.importance, fact.sensitivity
  );
  line
}

/// Translate 1-based source indices back to fact IDs. If any index is
/// missing, zero, or out of range, fall back to crediting every candidate
/// as a source rather than guessing which ones the LLM meant.
fn translate_indices(indices: &[usize], candidates: &[MemoryFact], all_ids: &[Uuid]) -> Vec<Uuid> {
  if indices.is_empty() {
    return all_ids.to_vec();
  }

  let mut resolved = Vec::with_capacity(indices.len());
  for &index in indices {
    let Some(fact) = index.checked_sub(1).and_then(|i| candidates.get(i)) else {
      return all_ids.to_vec();
    };
    resolved.push(fact.id);
  }

  let unique: HashSet<Uuid> = resolved.into_iter().collect();
  unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::testing::{FakeCompletions, FakeEmbeddings, InMemoryStorage};

  fn fact(category: &str, tags: Vec<String>) -> MemoryFact {
    MemoryFact {
      id: Uuid::now_v7(),
      content: "some fact".to_owned(),
      category: category.to_owned(),
      subject: "user".to_owned(),
      attribute: "likes".to_owned(),
      value: "tea".to_owned(),
      temporal_context: None,
      importance: 5,
      sensitivity: Sensitivity::Low,
      source: "notes".to_owned(),
      timestamp: Utc::now(),
      tags,
      metadata: HashMap::new(),
      document_references: Vec::new(),
      embedding: vec![0.0; 8],
    }
  }

  #[tokio::test]
  async fn empty_candidates_yields_empty_report() {
    let consolidator = Consolidator::new(
      Arc::new(FakeCompletions::with_facts(vec![])),
      Arc::new(FakeEmbeddings::default()),
      Arc::new(InMemoryStorage::new()),
    );

    let report = consolidator.consolidate_by_category("diet", "food".to_owned(), false).await.unwrap();
    assert_eq!(report.source_fact_count, 0);
    assert!(report.consolidated_facts.is_empty());
  }

  #[tokio::test]
  async fn out_of_range_index_falls_back_to_all_sources() {
    let storage = InMemoryStorage::new();
    storage.seed_fact(fact("food", vec!["diet".to_owned()]));
    storage.seed_fact(fact("food", vec!["diet".to_owned()]));

    let candidate_ids = vec![Uuid::now_v7()];
    assert_eq!(
      translate_indices(&[99], &[fact("food", vec![])], &candidate_ids),
      candidate_ids
    );
  }

  #[test]
  fn export_report_writes_indented_json() {
    let report = ConsolidationReport {
      topic: "diet".to_owned(),
      summary: "consolidated 1 fact(s) from 2 source fact(s)".to_owned(),
      consolidated_facts: Vec::new(),
      source_fact_count: 2,
      generated_at: Utc::now(),
    };

    let dir = std::env::temp_dir().join(format!("corpusmem-report-{}.json", Uuid::now_v7()));
    export_report(&report, &dir).unwrap();

    let written = std::fs::read_to_string(&dir).unwrap();
    assert!(written.contains("\n  "), "expected indented JSON, got: {written}");
    let parsed: ConsolidationReport = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed.topic, "diet");

    std::fs::remove_file(&dir).ok();
  }
}
