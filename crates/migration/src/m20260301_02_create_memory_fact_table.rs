use sea_orm_migration::{
  prelude::*,
  schema::{custom, integer, json_binary, text, text_null, timestamp_with_time_zone, uuid},
  sea_orm::Statement,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(MemoryFact::Table)
          .if_not_exists()
          .col(uuid(MemoryFact::Id).primary_key())
          .col(text(MemoryFact::Content))
          .col(text(MemoryFact::Category))
          .col(text(MemoryFact::Subject))
          .col(text(MemoryFact::Attribute))
          .col(text(MemoryFact::Value))
          .col(text_null(MemoryFact::TemporalContext))
          .col(integer(MemoryFact::Importance))
          .col(text(MemoryFact::Sensitivity))
          .col(text(MemoryFact::Source))
          .col(timestamp_with_time_zone(MemoryFact::Timestamp))
          .col(json_binary(MemoryFact::Tags))
          .col(json_binary(MemoryFact::Metadata))
          .col(custom(MemoryFact::DocumentReferences, "UUID[] NOT NULL DEFAULT '{}'"))
          .col(custom(MemoryFact::Embedding, "vector(1024)").not_null())
          .col(timestamp_with_time_zone(MemoryFact::CreatedAt))
          .to_owned(),
      )
      .await?;

    // HNSW index for cosine similarity search on the fact embedding.
    manager
      .get_connection()
      .execute_raw(Statement::from_string(
        manager.get_database_backend(),
        "CREATE INDEX idx_memory_fact_embedding ON memory_fact USING hnsw (embedding vector_cosine_ops);",
      ))
      .await?;

    // BM25 full-text index for fact content.
    manager
      .get_connection()
      .execute_raw(Statement::from_string(
        manager.get_database_backend(),
        "CREATE INDEX idx_memory_fact_content_bm25 ON memory_fact USING bm25 (id, (content::pdb.icu), created_at) WITH (key_field='id');",
      ))
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_memory_fact_category")
          .table(MemoryFact::Table)
          .col(MemoryFact::Category)
          .to_owned(),
      )
      .await?;

    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(MemoryFact::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum MemoryFact {
  Table,

  Id, // uuid v7, stable across UPDATE

  Content, // searchable natural-language text

  // Structured fields
  Category,
  Subject,
  Attribute,
  Value,
  TemporalContext,

  Importance,
  Sensitivity, // "low" | "medium" | "high"

  Source,
  Timestamp,

  Tags,              // text[] stored as jsonb
  Metadata,          // string -> string map stored as jsonb
  DocumentReferences, // source document IDs (UUID[])

  Embedding, // vector(1024) embedding of Content

  CreatedAt,
}
