use crate::domain::PreparedDocument;

/// Partition `prepared` into at most `worker_count` contiguous chunks
/// preserving input order. `worker_count <= 0` yields a single chunk;
/// validating that config elsewhere is the caller's job.
#[must_use]
pub fn distribute_work(prepared: Vec<PreparedDocument>, worker_count: i64) -> Vec<Vec<PreparedDocument>> {
  if prepared.is_empty() {
    return Vec::new();
  }

  if worker_count <= 0 {
    return vec![prepared];
  }

  let worker_count = (worker_count as usize).min(prepared.len());
  let chunk_size = prepared.len().div_ceil(worker_count);

  prepared
    .chunks(chunk_size)
    .map(<[PreparedDocument]>::to_vec)
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use corpusmem_shared::Document;

  use super::*;

  fn units(n: usize) -> Vec<PreparedDocument> {
    (0..n)
      .map(|_| PreparedDocument {
        document: Document::new_text("s", "c"),
        speaker_id: String::new(),
        timestamp: Utc::now(),
        date_string: "2026-01-01".to_owned(),
      })
      .collect()
  }

  #[test]
  fn preserves_order_and_respects_worker_cap() {
    let chunks = distribute_work(units(10), 3);
    assert!(chunks.len() <= 3);
    let flattened: usize = chunks.iter().map(Vec::len).sum();
    assert_eq!(flattened, 10);
  }

  #[test]
  fn non_positive_worker_count_is_single_chunk() {
    let chunks = distribute_work(units(5), 0);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len(), 5);
  }

  #[test]
  fn empty_input_is_empty_output() {
    assert!(distribute_work(Vec::new(), 4).is_empty());
  }

  #[test]
  fn more_workers_than_items_never_produces_empty_chunks() {
    let chunks = distribute_work(units(2), 10);
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| !c.is_empty()));
  }
}
