use axum::Json;
use axum::extract::State;
use corpusmem_core::MemoryFact;
use corpusmem_shared::AppError;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::utils::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StoreFactsRequest {
  pub facts: Vec<MemoryFact>,
}

/// Persist already-decided memory facts directly, bypassing the per-fact
/// decision engine.
#[utoipa::path(
  post,
  path = "/api/v0/facts",
  request_body = StoreFactsRequest,
  responses(
    (status = 200, description = "facts stored"),
    (status = 400, description = "facts array was malformed")
  )
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state), fields(fact_count = payload.facts.len()))]
pub async fn store_facts(State(state): State<AppState>, Json(payload): Json<StoreFactsRequest>) -> Result<Json<()>, AppError> {
  state.engine.store_batch(&payload.facts).await?;
  tracing::info!(count = payload.facts.len(), "stored facts directly");
  Ok(Json(()))
}
