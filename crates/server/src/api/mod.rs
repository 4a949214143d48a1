use axum::{
  Json, Router,
  routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::utils::AppState;

mod consolidate;
mod ingest;
mod store_facts;

pub use consolidate::{ConsolidateByCategoryRequest, ConsolidateBySemanticRequest, ConsolidateByTagRequest};
pub use ingest::{IngestConfigRequest, IngestRequest};
pub use store_facts::StoreFactsRequest;

#[derive(OpenApi)]
#[openapi(
  info(
    title = "Corpus Memory API",
    version = "0.1.0",
    description = "Memory-ingestion pipeline and memory-update decision engine for a personal AI agent"
  ),
  paths(
    ingest::ingest,
    store_facts::store_facts,
    consolidate::consolidate_by_tag,
    consolidate::consolidate_by_category,
    consolidate::consolidate_by_semantic,
  ),
  components(schemas(
    IngestRequest,
    IngestConfigRequest,
    StoreFactsRequest,
    ConsolidateByTagRequest,
    ConsolidateByCategoryRequest,
    ConsolidateBySemanticRequest,
    corpusmem_core::Progress,
    corpusmem_core::Stage,
    corpusmem_core::MemoryFact,
    corpusmem_core::Sensitivity,
    corpusmem_core::ConsolidationReport,
    corpusmem_core::ConsolidatedFact,
    corpusmem_shared::Document,
    corpusmem_shared::DocumentKind,
    corpusmem_shared::ConversationMessage,
  ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
  Json(ApiDoc::openapi())
}

pub fn app() -> Router<AppState> {
  Router::new()
    .route("/api/v0/ingest", post(ingest::ingest))
    .route("/api/v0/facts", post(store_facts::store_facts))
    .route("/api/v0/consolidate/tag", post(consolidate::consolidate_by_tag))
    .route("/api/v0/consolidate/category", post(consolidate::consolidate_by_category))
    .route("/api/v0/consolidate/semantic", post(consolidate::consolidate_by_semantic))
    .route("/openapi.json", get(openapi_json))
    .merge(Scalar::with_url("/openapi/", ApiDoc::openapi()))
}
