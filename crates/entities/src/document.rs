use sea_orm::entity::prelude::*;
use serde_json::Value as Json;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "document")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,

  pub source: String,
  pub timestamp: Option<DateTimeWithTimeZone>,

  pub tags: Json,
  pub metadata: Json,

  /// "conversation" | "text"
  pub kind: Option<String>,
  /// The tagged `DocumentKind` payload, stored verbatim as JSON.
  pub body: Json,

  pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
