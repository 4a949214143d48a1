use sea_orm::entity::prelude::*;
use sea_orm::prelude::PgVector;
use serde_json::Value as Json;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "memory_fact")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,

  pub content: String,

  pub category: String,
  pub subject: String,
  pub attribute: String,
  pub value: String,
  pub temporal_context: Option<String>,

  pub importance: i32,
  pub sensitivity: String,

  pub source: String,
  pub timestamp: DateTimeWithTimeZone,

  pub tags: Json,
  pub metadata: Json,
  pub document_references: Vec<Uuid>,

  pub embedding: PgVector,

  pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
