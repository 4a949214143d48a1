use std::sync::Arc;

use corpusmem_ai::{OpenAiCompletions, OpenAiEmbeddings};
use corpusmem_core::{Consolidator, Engine};
use corpusmem_migration::{Migrator, MigratorTrait};
use corpusmem_shared::{APP_ENV, AppError};
use corpusmem_store::PgStorage;
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db = Database::connect(APP_ENV.database_url.as_str()).await?;

  // Apply all pending migrations
  // https://www.sea-ql.org/SeaORM/docs/migration/running-migration/#migrating-programmatically
  Migrator::up(&db, None).await?;

  let completions = Arc::new(OpenAiCompletions);
  let embeddings = Arc::new(OpenAiEmbeddings::default());
  let storage = Arc::new(PgStorage::new(db, embeddings.clone()));

  let engine = Arc::new(Engine::new(completions.clone(), embeddings.clone(), storage.clone()));
  let consolidator = Arc::new(Consolidator::new(completions, embeddings, storage));

  corpusmem_server::server(engine, consolidator, &APP_ENV.bind_addr).await
}
