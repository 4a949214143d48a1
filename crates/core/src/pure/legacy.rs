use chrono::{DateTime, Utc};
use corpusmem_shared::ConversationMessage;

/// Split flat `"Speaker: text"`-prefixed lines into conversation messages.
///
/// This is a pre-processing adapter for callers still holding legacy flat
/// text; it is never invoked from the core pipeline, which expects a caller
/// to construct a structured `DocumentKind::Conversation` directly. Lines
/// without a recognizable `Speaker:` prefix are attributed to `fallback_speaker`.
#[must_use]
pub fn split_speaker_prefixed_text(
  text: &str,
  fallback_speaker: &str,
  time: DateTime<Utc>,
) -> Vec<ConversationMessage> {
  text
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(|line| match line.split_once(':') {
      Some((speaker, content)) if !speaker.trim().is_empty() && !speaker.contains(' ') => {
        ConversationMessage {
          speaker: speaker.trim().to_owned(),
          content: content.trim().to_owned(),
          time,
        }
      }
      _ => ConversationMessage {
        speaker: fallback_speaker.to_owned(),
        content: line.trim().to_owned(),
        time,
      },
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_recognizable_speaker_prefixes() {
    let messages = split_speaker_prefixed_text("alice: hi\nbob: hello", "user", Utc::now());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].speaker, "alice");
    assert_eq!(messages[1].speaker, "bob");
  }

  #[test]
  fn falls_back_for_unprefixed_lines() {
    let messages = split_speaker_prefixed_text("just some text", "user", Utc::now());
    assert_eq!(messages[0].speaker, "user");
  }
}
