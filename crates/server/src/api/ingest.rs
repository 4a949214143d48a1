use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use corpusmem_core::{IngestConfig, Progress};
use corpusmem_shared::{AppError, Document};
use futures::stream::Stream;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::utils::AppState;

const fn default_workers() -> usize {
  4
}

const fn default_batch_size() -> usize {
  20
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestConfigRequest {
  #[serde(default = "default_workers")]
  pub workers: usize,
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  #[serde(default)]
  pub per_speaker_expansion: Option<bool>,
}

impl From<IngestConfigRequest> for IngestConfig {
  fn from(request: IngestConfigRequest) -> Self {
    let defaults = Self::default();
    Self {
      workers: request.workers,
      batch_size: request.batch_size,
      per_speaker_expansion: request.per_speaker_expansion.unwrap_or(defaults.per_speaker_expansion),
      ..defaults
    }
  }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
  pub documents: Vec<Document>,
  #[serde(default)]
  pub config: Option<IngestConfigRequest>,
}

/// Ingest documents into the memory store, streaming progress as it happens.
#[utoipa::path(
  post,
  path = "/api/v0/ingest",
  request_body = IngestRequest,
  responses(
    (status = 200, description = "text/event-stream of Progress events, then a final error/done event"),
    (status = 400, description = "documents array was empty or malformed")
  )
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state), fields(document_count = payload.documents.len()))]
pub async fn ingest(
  State(state): State<AppState>,
  Json(payload): Json<IngestRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
  let config: IngestConfig = payload.config.map(Into::into).unwrap_or_default();
  let cancel = CancellationToken::new();

  let (progress_rx, error_rx) = corpusmem_core::pipeline::store(Arc::clone(&state.engine), payload.documents, config, cancel);

  let progress_stream = ReceiverStream::new(progress_rx).map(PipelineEvent::Progress);
  let error_stream = ReceiverStream::new(error_rx).map(PipelineEvent::Error);

  let merged = progress_stream.merge(error_stream).map(|event| {
    let sse_event = match event {
      PipelineEvent::Progress(progress) => {
        Event::default().event("progress").json_data(&progress).unwrap_or_else(|err| Event::default().event("error").data(err.to_string()))
      }
      PipelineEvent::Error(err) => Event::default().event("error").data(err.to_string()),
    };
    Ok(sse_event)
  });

  Ok(Sse::new(merged).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

enum PipelineEvent {
  Progress(Progress),
  Error(AppError),
}
