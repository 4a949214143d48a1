use axum::http::StatusCode;
use corpusmem_shared::AppError;

use crate::domain::ExistingMemory;

/// Enforce speaker-scope legality for an UPDATE/DELETE target.
///
/// A document-level requester (`requesting_speaker_id == ""`) may never touch
/// a speaker-scoped target; a speaker-scoped requester may only touch its own
/// facts. Applies identically to UPDATE and DELETE.
pub fn validate_memory_operation(requesting_speaker_id: &str, target: &ExistingMemory) -> Result<(), AppError> {
  let target_speaker_id = target.speaker_id().unwrap_or("");

  let legal = match (requesting_speaker_id, target_speaker_id) {
    ("", "") => true,
    ("", _) => false,
    (requester, target) => requester == target,
  };

  if legal {
    Ok(())
  } else {
    Err(AppError::with_status(
      StatusCode::FORBIDDEN,
      anyhow::anyhow!(
        "speaker scope violation: requester={requesting_speaker_id:?} target={target_speaker_id:?}"
      ),
    ))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn target_with_speaker(speaker_id: Option<&str>) -> ExistingMemory {
    let mut metadata = HashMap::new();
    if let Some(id) = speaker_id {
      metadata.insert("speakerID".to_owned(), id.to_owned());
    }
    ExistingMemory {
      id: Uuid::now_v7(),
      content: "fact".to_owned(),
      timestamp: Utc::now(),
      score: 0.1,
      metadata,
    }
  }

  #[test]
  fn document_level_cannot_touch_speaker_scoped_target() {
    let target = target_with_speaker(Some("alice"));
    assert!(validate_memory_operation("", &target).is_err());
  }

  #[test]
  fn speaker_cannot_touch_another_speakers_fact() {
    let target = target_with_speaker(Some("bob"));
    assert!(validate_memory_operation("alice", &target).is_err());
  }

  #[test]
  fn speaker_cannot_touch_document_level_fact() {
    let target = target_with_speaker(None);
    assert!(validate_memory_operation("alice", &target).is_err());
  }

  #[test]
  fn matching_scopes_are_legal() {
    let target = target_with_speaker(Some("alice"));
    assert!(validate_memory_operation("alice", &target).is_ok());

    let doc_level = target_with_speaker(None);
    assert!(validate_memory_operation("", &doc_level).is_ok());
  }
}
