use sea_orm_migration::{
  prelude::*,
  schema::{json_binary, string_null, text, timestamp_with_time_zone_null, uuid},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Document::Table)
          .if_not_exists()
          .col(uuid(Document::Id).primary_key())
          .col(text(Document::Source))
          .col(timestamp_with_time_zone_null(Document::Timestamp))
          .col(json_binary(Document::Tags))
          .col(json_binary(Document::Metadata))
          .col(string_null(Document::Kind))
          .col(json_binary(Document::Body))
          .col(timestamp_with_time_zone_null(Document::CreatedAt))
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Document::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Document {
  Table,

  Id, // uuid v7

  Source,
  // resolved event timestamp, nullable until preparation resolves it
  Timestamp,
  // text[] stored as jsonb array
  Tags,
  // string -> string map stored as jsonb
  Metadata,
  // "conversation" | "text"
  Kind,
  // the tagged DocumentKind payload, stored as jsonb
  Body,
  // ingest timestamp
  CreatedAt,
}
