use std::sync::Arc;

use async_trait::async_trait;
use corpusmem_ai::EmbeddingsService;
use corpusmem_core::{DocumentReference, ExistingMemory, Filter, MemoryFact, QueryResult, Storage, TagMatch};
use corpusmem_entities::memory_fact;
use corpusmem_migration::{Migrator, MigratorTrait};
use corpusmem_shared::{AppError, Document};
use sea_orm::prelude::PgVector;
use sea_orm::sea_query::Value;
use sea_orm::{
  ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, IntoActiveModel,
  QueryFilter, Statement,
};
use uuid::Uuid;

use crate::conversions::{document_to_model, fact_to_model, model_to_document, model_to_fact};

/// Candidate pool size fetched per search leg (BM25, vector) before RRF merging.
const RETRIEVAL_CANDIDATE_LIMIT: i64 = 100;
const DEFAULT_QUERY_LIMIT: usize = 50;
const DEFAULT_DISTANCE: f64 = 0.8;

/// Postgres/pgvector implementation of [`Storage`], combining BM25 and
/// vector search legs with Reciprocal Rank Fusion.
/// Holds its own embeddings handle because the `Storage::query` contract
/// takes raw text rather than a pre-computed vector, so the vector leg
/// must be embedded internally rather than by the caller.
pub struct PgStorage {
  db: DatabaseConnection,
  embeddings: Arc<dyn EmbeddingsService>,
}

impl PgStorage {
  #[must_use]
  pub const fn new(db: DatabaseConnection, embeddings: Arc<dyn EmbeddingsService>) -> Self {
    Self { db, embeddings }
  }
}

/// Append ` AND {sql}` to `conditions`, substituting `{p}` with the next
/// positional placeholder, and push `value` onto `values` in lockstep.
fn append_condition(conditions: &mut String, values: &mut Vec<Value>, next_param: &mut usize, sql: &str, value: Value) {
  conditions.push_str(" AND ");
  conditions.push_str(&sql.replace("{p}", &format!("${next_param}")));
  values.push(value);
  *next_param += 1;
}

#[async_trait]
impl Storage for PgStorage {
  async fn query(&self, text: &str, filter: Option<&Filter>) -> Result<QueryResult, AppError> {
    let filter = filter.cloned().unwrap_or_default();
    let limit = filter.limit.unwrap_or(DEFAULT_QUERY_LIMIT) as i64;
    let distance = if filter.distance > 0.0 { filter.distance } else { DEFAULT_DISTANCE };

    let query_embedding = PgVector::from(self.embeddings.embed(text).await?);

    // Placeholders $1..$5 are fixed (text, candidate limit, embedding,
    // distance, final limit); extra filter predicates append starting at $6.
    let mut conditions = String::new();
    let mut values: Vec<Value> = vec![
      text.to_owned().into(),
      RETRIEVAL_CANDIDATE_LIMIT.into(),
      query_embedding.into(),
      distance.into(),
      limit.into(),
    ];
    let mut next_param = values.len() + 1;

    if let Some(source) = &filter.source {
      append_condition(&mut conditions, &mut values, &mut next_param, "source = {p}", source.clone().into());
    }
    if let Some(contact_name) = &filter.contact_name {
      append_condition(
        &mut conditions,
        &mut values,
        &mut next_param,
        "metadata->>'speakerID' = {p}",
        contact_name.clone().into(),
      );
    }
    if let Some(category) = &filter.fact_category {
      append_condition(&mut conditions, &mut values, &mut next_param, "category = {p}", category.clone().into());
    }
    if let Some((mode, tags)) = &filter.tags {
      let operator = match mode {
        TagMatch::All => "?&",
        TagMatch::Any => "?|",
      };
      let tag_array = Value::Array(sea_orm::sea_query::ArrayType::String, Some(Box::new(tags.iter().cloned().map(Into::into).collect())));
      append_condition(&mut conditions, &mut values, &mut next_param, &format!("tags {operator} {{p}}"), tag_array);
    }

    let sql = format!(
      r"
      WITH
      fulltext AS (
        SELECT id, ROW_NUMBER() OVER (ORDER BY pdb.score(id) DESC) AS r
        FROM memory_fact
        WHERE content ||| $1 {conditions}
        LIMIT $2
      ),
      vector AS (
        SELECT id, ROW_NUMBER() OVER (ORDER BY embedding <=> $3) AS r
        FROM memory_fact
        WHERE 1 = 1 {conditions}
        LIMIT $2
      ),
      rrf AS (
        SELECT id, 1.0 / (60 + r) AS s FROM fulltext
        UNION ALL
        SELECT id, 1.0 / (60 + r) AS s FROM vector
      ),
      rrf_score AS (
        SELECT id, SUM(s)::float8 AS score
        FROM rrf
        GROUP BY id
      )
      SELECT m.*, r.score AS score
      FROM rrf_score r
      JOIN memory_fact m USING (id)
      WHERE (1 - (m.embedding <=> $3)) <= $4
      ORDER BY r.score DESC
      LIMIT $5;
      ",
    );

    let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);

    let rows = self.db.query_all_raw(stmt).await?;
    let mut facts = Vec::with_capacity(rows.len());
    for row in rows {
      let model = memory_fact::Model::from_query_result(&row, "")?;
      let score: f64 = row.try_get("", "score").unwrap_or(0.0);
      let fact = model_to_fact(model);
      facts.push(ExistingMemory {
        id: fact.id,
        content: fact.content,
        timestamp: fact.timestamp,
        score,
        metadata: fact.metadata,
      });
    }

    Ok(QueryResult {
      facts,
      documents: Vec::new(),
    })
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryFact>, AppError> {
    let model = memory_fact::Entity::find_by_id(id).one(&self.db).await?;
    Ok(model.map(model_to_fact))
  }

  async fn update(&self, id: Uuid, content: &str, vector: Vec<f32>) -> Result<(), AppError> {
    if let Some(model) = memory_fact::Entity::find_by_id(id).one(&self.db).await? {
      let mut active = model.into_active_model();
      active.content = sea_orm::Set(content.to_owned());
      active.value = sea_orm::Set(content.to_owned());
      active.embedding = sea_orm::Set(PgVector::from(vector));
      active.update(&self.db).await?;
      tracing::debug!(memory_id = %id, "updated memory fact");
    } else {
      tracing::warn!(memory_id = %id, "update requested for missing memory fact");
    }
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> Result<(), AppError> {
    memory_fact::Entity::delete_by_id(id).exec(&self.db).await?;
    Ok(())
  }

  async fn store_batch(&self, objects: &[MemoryFact]) -> Result<(), AppError> {
    if objects.is_empty() {
      return Ok(());
    }
    let models: Vec<memory_fact::ActiveModel> = objects.iter().map(fact_to_model).map(IntoActiveModel::into_active_model).collect();
    memory_fact::Entity::insert_many(models).exec(&self.db).await?;
    tracing::info!(count = objects.len(), "stored memory fact batch");
    Ok(())
  }

  async fn delete_all(&self) -> Result<(), AppError> {
    memory_fact::Entity::delete_many().exec(&self.db).await?;
    Ok(())
  }

  async fn ensure_schema_exists(&self) -> Result<(), AppError> {
    Migrator::up(&self.db, None).await?;
    Ok(())
  }

  async fn upsert_document(&self, document: &Document) -> Result<Uuid, AppError> {
    let model = document_to_model(document);
    let active = model.into_active_model();
    corpusmem_entities::Document::insert(active)
      .on_conflict(
        sea_orm::sea_query::OnConflict::column(corpusmem_entities::document::Column::Id)
          .update_columns([
            corpusmem_entities::document::Column::Source,
            corpusmem_entities::document::Column::Timestamp,
            corpusmem_entities::document::Column::Tags,
            corpusmem_entities::document::Column::Metadata,
            corpusmem_entities::document::Column::Kind,
            corpusmem_entities::document::Column::Body,
          ])
          .to_owned(),
      )
      .exec(&self.db)
      .await?;
    Ok(document.id)
  }

  async fn get_stored_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
    let model = corpusmem_entities::Document::find_by_id(id).one(&self.db).await?;
    Ok(model.and_then(model_to_document))
  }

  async fn get_stored_documents_batch(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
    let models = corpusmem_entities::Document::find()
      .filter(corpusmem_entities::document::Column::Id.is_in(ids.to_vec()))
      .all(&self.db)
      .await?;
    Ok(models.into_iter().filter_map(model_to_document).collect())
  }

  async fn get_facts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MemoryFact>, AppError> {
    let models = memory_fact::Entity::find()
      .filter(memory_fact::Column::Id.is_in(ids.to_vec()))
      .all(&self.db)
      .await?;
    Ok(models.into_iter().map(model_to_fact).collect())
  }

  async fn get_document_references(&self, memory_id: Uuid) -> Result<Vec<DocumentReference>, AppError> {
    let Some(model) = memory_fact::Entity::find_by_id(memory_id).one(&self.db).await? else {
      return Ok(Vec::new());
    };

    let documents = self.get_stored_documents_batch(&model.document_references).await?;
    Ok(
      documents
        .into_iter()
        .map(|document| DocumentReference {
          document_id: document.id,
          source: document.source,
        })
        .collect(),
    )
  }
}
