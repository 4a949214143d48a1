use axum::Json;
use axum::extract::State;
use corpusmem_core::ConsolidationReport;
use corpusmem_shared::AppError;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::utils::AppState;

const fn default_persist() -> bool {
  true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConsolidateByTagRequest {
  pub topic: String,
  pub tags: Vec<String>,
  #[serde(default = "default_persist")]
  pub persist: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConsolidateByCategoryRequest {
  pub topic: String,
  pub category: String,
  #[serde(default = "default_persist")]
  pub persist: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConsolidateBySemanticRequest {
  pub topic: String,
  pub query: String,
  pub distance: Option<f64>,
  pub limit: Option<usize>,
  #[serde(default = "default_persist")]
  pub persist: bool,
}

/// Consolidate every fact carrying all of the given tags into a smaller set
/// of synthesized facts.
#[utoipa::path(
  post,
  path = "/api/v0/consolidate/tag",
  request_body = ConsolidateByTagRequest,
  responses((status = 200, description = "Consolidation report", body = ConsolidationReport))
)]
#[axum::debug_handler]
pub async fn consolidate_by_tag(
  State(state): State<AppState>,
  Json(payload): Json<ConsolidateByTagRequest>,
) -> Result<Json<ConsolidationReport>, AppError> {
  let report = state.consolidator.consolidate_by_tag(&payload.topic, payload.tags, payload.persist).await?;
  Ok(Json(report))
}

/// Consolidate every fact in a category into a smaller set of synthesized facts.
#[utoipa::path(
  post,
  path = "/api/v0/consolidate/category",
  request_body = ConsolidateByCategoryRequest,
  responses((status = 200, description = "Consolidation report", body = ConsolidationReport))
)]
#[axum::debug_handler]
pub async fn consolidate_by_category(
  State(state): State<AppState>,
  Json(payload): Json<ConsolidateByCategoryRequest>,
) -> Result<Json<ConsolidationReport>, AppError> {
  let report = state.consolidator.consolidate_by_category(&payload.topic, payload.category, payload.persist).await?;
  Ok(Json(report))
}

/// Consolidate facts found by a semantic query into a smaller set of
/// synthesized facts.
#[utoipa::path(
  post,
  path = "/api/v0/consolidate/semantic",
  request_body = ConsolidateBySemanticRequest,
  responses((status = 200, description = "Consolidation report", body = ConsolidationReport))
)]
#[axum::debug_handler]
pub async fn consolidate_by_semantic(
  State(state): State<AppState>,
  Json(payload): Json<ConsolidateBySemanticRequest>,
) -> Result<Json<ConsolidationReport>, AppError> {
  let report = state
    .consolidator
    .consolidate_by_semantic(&payload.topic, payload.query, payload.distance, payload.limit, payload.persist)
    .await?;
  Ok(Json(report))
}
