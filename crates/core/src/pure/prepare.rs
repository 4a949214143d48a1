use chrono::{DateTime, Utc};
use corpusmem_shared::{Document, DocumentKind};

use crate::domain::PreparedDocument;

/// Normalize timestamps, classify document type, and (when `per_speaker_expansion`
/// is set) expand a conversation into one prepared unit per distinct participant.
///
/// Document-level text always yields a single unit with `speaker_id == ""`.
#[must_use]
pub fn prepare_documents(
  docs: &[Document],
  now: DateTime<Utc>,
  per_speaker_expansion: bool,
) -> Vec<PreparedDocument> {
  docs
    .iter()
    .flat_map(|doc| prepare_one(doc, now, per_speaker_expansion))
    .collect()
}

fn prepare_one(doc: &Document, now: DateTime<Utc>, per_speaker_expansion: bool) -> Vec<PreparedDocument> {
  let timestamp = doc.timestamp.unwrap_or(now);
  let date_string = timestamp.format("%Y-%m-%d").to_string();

  match &doc.kind {
    DocumentKind::Text { .. } => vec![PreparedDocument {
      document: doc.clone(),
      speaker_id: String::new(),
      timestamp,
      date_string,
    }],
    DocumentKind::Conversation { people, .. } => {
      if !per_speaker_expansion || people.is_empty() {
        return vec![PreparedDocument {
          document: doc.clone(),
          speaker_id: String::new(),
          timestamp,
          date_string,
        }];
      }

      people
        .iter()
        .map(|speaker| PreparedDocument {
          document: doc.clone(),
          speaker_id: speaker.clone(),
          timestamp,
          date_string: date_string.clone(),
        })
        .collect()
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use chrono::TimeZone;
  use corpusmem_shared::ConversationMessage;

  use super::*;

  fn conversation() -> Document {
    Document {
      id: uuid::Uuid::now_v7(),
      source: "chat".to_owned(),
      timestamp: None,
      tags: vec![],
      metadata: HashMap::new(),
      kind: DocumentKind::Conversation {
        messages: vec![ConversationMessage {
          speaker: "alice".to_owned(),
          content: "hi".to_owned(),
          time: Utc::now(),
        }],
        people: vec!["alice".to_owned(), "bob".to_owned()],
        user: "alice".to_owned(),
      },
    }
  }

  #[test]
  fn missing_timestamp_resolves_to_now() {
    let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
    let doc = Document::new_text("notes", "hello");
    let prepared = prepare_documents(std::slice::from_ref(&doc), now, true);
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared[0].timestamp, now);
    assert_eq!(prepared[0].date_string, "2026-01-02");
  }

  #[test]
  fn text_document_is_document_level() {
    let doc = Document::new_text("notes", "hello");
    let prepared = prepare_documents(std::slice::from_ref(&doc), Utc::now(), true);
    assert_eq!(prepared[0].speaker_id, "");
  }

  #[test]
  fn conversation_expands_per_speaker_when_enabled() {
    let doc = conversation();
    let prepared = prepare_documents(std::slice::from_ref(&doc), Utc::now(), true);
    assert_eq!(prepared.len(), 2);
    assert_eq!(prepared[0].speaker_id, "alice");
    assert_eq!(prepared[1].speaker_id, "bob");
  }

  #[test]
  fn conversation_stays_document_level_when_disabled() {
    let doc = conversation();
    let prepared = prepare_documents(std::slice::from_ref(&doc), Utc::now(), false);
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared[0].speaker_id, "");
  }
}
