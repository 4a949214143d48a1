use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single turn in a conversational document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationMessage {
  pub speaker: String,
  pub content: String,
  pub time: DateTime<Utc>,
}

/// The two document shapes the pipeline accepts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentKind {
  Conversation {
    messages: Vec<ConversationMessage>,
    /// Every participant mentioned in the conversation.
    people: Vec<String>,
    /// The primary human user this memory store belongs to.
    user: String,
  },
  Text {
    content: String,
  },
}

/// A source document belonging to a single user, to be ingested into the
/// memory store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
  pub id: Uuid,
  pub source: String,
  /// Missing timestamp is resolved to ingest time during preparation.
  pub timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
  #[serde(flatten)]
  pub kind: DocumentKind,
}

impl Document {
  #[must_use]
  pub fn new_text(source: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      id: Uuid::now_v7(),
      source: source.into(),
      timestamp: None,
      tags: Vec::new(),
      metadata: HashMap::new(),
      kind: DocumentKind::Text {
        content: content.into(),
      },
    }
  }

  #[must_use]
  pub const fn is_conversation(&self) -> bool {
    matches!(self.kind, DocumentKind::Conversation { .. })
  }

  /// Flat textual projection of the document, for extraction prompts.
  #[must_use]
  pub fn content(&self) -> String {
    match &self.kind {
      DocumentKind::Text { content } => content.clone(),
      DocumentKind::Conversation { messages, .. } => messages
        .iter()
        .map(|m| format!("{}: {}", m.speaker, m.content))
        .collect::<Vec<_>>()
        .join("\n"),
    }
  }

  /// Split this document into sub-documents of at most `max_chars` of
  /// projected content each. Conversations are split on message boundaries
  /// (never mid-message); plain text is split on character boundaries.
  /// Tags, source, and metadata are inherited by every chunk; each chunk
  /// gets a fresh ID and a `chunk:<n>` tag.
  #[must_use]
  pub fn chunk(&self, max_chars: usize) -> Vec<Self> {
    if max_chars == 0 || self.content().len() <= max_chars {
      return vec![self.clone()];
    }

    match &self.kind {
      DocumentKind::Text { content } => self.chunk_text(content, max_chars),
      DocumentKind::Conversation {
        messages,
        people,
        user,
      } => self.chunk_conversation(messages, people, user, max_chars),
    }
  }

  fn chunk_text(&self, content: &str, max_chars: usize) -> Vec<Self> {
    let mut chunks = Vec::new();
    let mut rest = content;
    let mut index = 0;
    while !rest.is_empty() {
      let split_at = floor_char_boundary(rest, max_chars.min(rest.len()));
      let (head, tail) = rest.split_at(split_at);
      chunks.push(self.derive_chunk(DocumentKind::Text { content: head.to_owned() }, index));
      rest = tail;
      index += 1;
    }
    chunks
  }

  fn chunk_conversation(
    &self,
    messages: &[ConversationMessage],
    people: &[String],
    user: &str,
    max_chars: usize,
  ) -> Vec<Self> {
    let mut chunks = Vec::new();
    let mut current: Vec<ConversationMessage> = Vec::new();
    let mut current_len = 0usize;
    let mut index = 0;

    for message in messages {
      let message_len = message.speaker.len() + message.content.len() + 2;
      if !current.is_empty() && current_len + message_len > max_chars {
        chunks.push(self.derive_chunk(
          DocumentKind::Conversation {
            messages: std::mem::take(&mut current),
            people: people.to_vec(),
            user: user.to_owned(),
          },
          index,
        ));
        index += 1;
        current_len = 0;
      }
      current_len += message_len;
      current.push(message.clone());
    }

    if !current.is_empty() {
      chunks.push(self.derive_chunk(
        DocumentKind::Conversation {
          messages: current,
          people: people.to_vec(),
          user: user.to_owned(),
        },
        index,
      ));
    }

    chunks
  }

  fn derive_chunk(&self, kind: DocumentKind, index: usize) -> Self {
    let mut tags = self.tags.clone();
    tags.push(format!("chunk:{index}"));
    Self {
      id: Uuid::now_v7(),
      source: self.source.clone(),
      timestamp: self.timestamp,
      tags,
      metadata: self.metadata.clone(),
      kind,
    }
  }
}

/// Truncate `idx` down to the nearest char boundary in `s`, matching the
/// behavior of the unstable `str::floor_char_boundary`.
fn floor_char_boundary(s: &str, idx: usize) -> usize {
  if idx >= s.len() {
    return s.len();
  }
  let mut idx = idx;
  while idx > 0 && !s.is_char_boundary(idx) {
    idx -= 1;
  }
  idx
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_content_round_trips() {
    let doc = Document::new_text("notes", "hello world");
    assert_eq!(doc.content(), "hello world");
  }

  #[test]
  fn chunk_preserves_total_content_for_text() {
    let doc = Document::new_text("notes", "abcdefghij");
    let chunks = doc.chunk(4);
    assert_eq!(chunks.len(), 3);
    let joined: String = chunks.iter().map(Document::content).collect();
    assert_eq!(joined, "abcdefghij");
  }

  #[test]
  fn chunk_below_limit_is_noop() {
    let doc = Document::new_text("notes", "short");
    let chunks = doc.chunk(1000);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].id, doc.id);
  }

  #[test]
  fn chunk_conversation_splits_on_message_boundaries() {
    let messages = vec![
      ConversationMessage {
        speaker: "alice".to_owned(),
        content: "hi there".to_owned(),
        time: Utc::now(),
      },
      ConversationMessage {
        speaker: "bob".to_owned(),
        content: "hello friend".to_owned(),
        time: Utc::now(),
      },
    ];
    let doc = Document {
      id: Uuid::now_v7(),
      source: "chat".to_owned(),
      timestamp: None,
      tags: vec![],
      metadata: HashMap::new(),
      kind: DocumentKind::Conversation {
        messages,
        people: vec!["alice".to_owned(), "bob".to_owned()],
        user: "alice".to_owned(),
      },
    };

    let chunks = doc.chunk(20);
    assert_eq!(chunks.len(), 2);
    for chunk in &chunks {
      let DocumentKind::Conversation { messages, .. } = &chunk.kind else {
        panic!("expected conversation chunk");
      };
      assert_eq!(messages.len(), 1);
    }
  }
}
