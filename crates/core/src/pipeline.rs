use std::sync::Arc;

use corpusmem_shared::{AppError, Document};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{ExtractedFact, FactResult, IngestConfig, MemoryFact, Progress, Stage};
use crate::engine::Engine;
use crate::pure::{distribute_work, prepare_documents};
use crate::worker_pool;

const FACT_CHANNEL_CAPACITY: usize = 1000;
const RESULT_CHANNEL_CAPACITY: usize = 1000;
const OBJECT_CHANNEL_CAPACITY: usize = 100;
const PROGRESS_CHANNEL_CAPACITY: usize = 100;

/// Streaming ingest entry point: documents flow through Extract → Process →
/// Aggregate → Store. Returns immediately; both streams close when the
/// pipeline terminates, for any reason.
pub fn store(
  engine: Arc<Engine>,
  documents: Vec<Document>,
  config: IngestConfig,
  cancel: CancellationToken,
) -> (mpsc::Receiver<Progress>, mpsc::Receiver<AppError>) {
  let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
  let (error_tx, error_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);

  tokio::spawn(run_pipeline(engine, documents, config, cancel, progress_tx, error_tx));

  (progress_rx, error_rx)
}

async fn emit_progress(tx: &mpsc::Sender<Progress>, processed: usize, total: usize, stage: Stage) {
  let _ = tx
    .send(Progress {
      processed,
      total,
      stage,
    })
    .await;
}

async fn run_pipeline(
  engine: Arc<Engine>,
  documents: Vec<Document>,
  config: IngestConfig,
  cancel: CancellationToken,
  progress_tx: mpsc::Sender<Progress>,
  error_tx: mpsc::Sender<AppError>,
) {
  emit_progress(&progress_tx, 0, documents.len(), Stage::Preparation).await;

  if documents.is_empty() {
    return;
  }

  let prepared = prepare_documents(&documents, chrono::Utc::now(), config.per_speaker_expansion);
  let prepared_count = prepared.len();

  emit_progress(&progress_tx, 0, prepared_count, Stage::FactExtraction).await;

  if cancel.is_cancelled() {
    let _ = error_tx.send(AppError::new(anyhow::anyhow!("cancelled"))).await;
    return;
  }

  let workers = config.workers;
  let batch_size = config.batch_size;
  let fact_extraction_timeout = config.fact_extraction_timeout;
  let memory_decision_timeout = config.memory_decision_timeout;

  let chunks = distribute_work(prepared, workers as i64);

  // --- Extract stage ---
  let (fact_tx, mut fact_rx) = mpsc::channel::<ExtractedFact>(FACT_CHANNEL_CAPACITY);
  let extract_engine = Arc::clone(&engine);
  let extract_cancel = cancel.clone();
  let extract_handle = tokio::spawn(async move {
    worker_pool::run(chunks, workers, fact_extraction_timeout, extract_cancel, move |chunk| {
      let engine = Arc::clone(&extract_engine);
      let fact_tx = fact_tx.clone();
      async move {
        for unit in chunk {
          let content = unit.document.content();
          match engine.extract_facts(&content, &unit.speaker_id).await {
            Ok(facts) => {
              for content in facts {
                let fact = ExtractedFact {
                  content,
                  speaker_id: unit.speaker_id.clone(),
                  source: unit.clone(),
                };
                if fact_tx.send(fact).await.is_err() {
                  return;
                }
              }
            }
            Err(_err) => {
              // Per-document extraction errors are non-fatal; the pipeline
              // simply yields no facts for this unit.
            }
          }
        }
      }
    })
    .await;
  });

  emit_progress(&progress_tx, prepared_count, prepared_count, Stage::FactProcessing).await;

  // --- Process stage ---
  let (result_tx, mut result_rx) = mpsc::channel::<FactResult>(RESULT_CHANNEL_CAPACITY);
  let process_engine = Arc::clone(&engine);
  let process_cancel = cancel.clone();
  let process_handle = tokio::spawn(async move {
    let mut facts = Vec::new();
    while let Some(fact) = fact_rx.recv().await {
      facts.push(fact);
    }
    worker_pool::run(facts, workers, memory_decision_timeout, process_cancel, move |fact| {
      let engine = Arc::clone(&process_engine);
      let result_tx = result_tx.clone();
      async move {
        let result = engine.process_fact(fact).await;
        let _ = result_tx.send(result).await;
      }
    })
    .await;
  });

  extract_handle.await.ok();

  emit_progress(&progress_tx, prepared_count, prepared_count, Stage::Aggregation).await;

  // --- Aggregate stage ---
  let (object_tx, mut object_rx) = mpsc::channel::<Vec<MemoryFact>>(OBJECT_CHANNEL_CAPACITY);
  let aggregate_handle = tokio::spawn(async move {
    let mut objects = Vec::new();
    while let Some(result) = result_rx.recv().await {
      if let Some(error) = &result.error {
        tracing::warn!(error = %error, "fact-level error during processing");
      }
      if let Some(object) = result.object {
        objects.push(object);
        if objects.len() >= batch_size {
          let batch = std::mem::take(&mut objects);
          if object_tx.send(batch).await.is_err() {
            return;
          }
        }
      }
    }
    if !objects.is_empty() {
      let _ = object_tx.send(objects).await;
    }
  });

  process_handle.await.ok();

  // --- Store stage ---
  let mut processed = 0usize;
  while let Some(batch) = object_rx.recv().await {
    let batch_len = batch.len();
    match engine.store_batch(&batch).await {
      Ok(()) => {
        processed += batch_len;
        emit_progress(&progress_tx, processed, prepared_count, Stage::Storage).await;
      }
      Err(err) => {
        let _ = error_tx.send(err).await;
        return;
      }
    }
  }

  aggregate_handle.await.ok();

  emit_progress(&progress_tx, prepared_count, prepared_count, Stage::Completed).await;
}
