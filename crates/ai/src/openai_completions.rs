use std::fmt::Write;

use async_openai::types::chat::{
  ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
  ChatCompletionRequestUserMessage,
};
use async_trait::async_trait;
use corpusmem_shared::AppError;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::schema::generate_structured;
use crate::traits::{ActionChoice, CandidateFact, CompletionsService, ConsolidationOutput};

const EXTRACT_SYSTEM_PROMPT: &str = "\
You extract discrete, speaker-attributed facts from a document so they can be \
stored as long-term memory.

Rules:
1. Only extract lasting facts: preferences, personal info, relationships, plans, \
   decisions. Ignore transient states (\"I'm hungry right now\" is NOT a fact).
2. Each fact must stand alone as a complete sentence, understandable without the \
   surrounding document.
3. Attribute facts to the given speaker explicitly when the document mixes \
   multiple people (e.g. \"Alice prefers tea over coffee\").
4. If nothing durable can be extracted, return an empty `facts` array.";

const DECIDE_SYSTEM_PROMPT: &str = "\
You decide how a newly extracted fact should affect an existing memory store.

You are given the new fact and a list of existing candidate facts for the same \
speaker, each tagged with its ID. Choose exactly one action:
1. \"add\": the new fact is not covered by any candidate — store it as-is.
2. \"update\": a candidate expresses the same thing but is now outdated or \
   incomplete — give the candidate's `fact_id` and the fact's updated content.
3. \"delete\": a candidate is directly contradicted by the new fact (e.g. moved \
   cities, changed their mind) — give the candidate's `fact_id`.
4. \"none\": the candidates already fully capture the new fact — do nothing.

Only reference a `fact_id` that appears in the candidate list.";

const CONSOLIDATION_SYSTEM_PROMPT: &str = "\
You are consolidating a group of related memory facts into a smaller set of \
clearer, non-redundant facts.

For each consolidated fact, give its merged content, a short topic label, and \
the 1-based indices of every source fact (from the numbered list below) it was \
synthesized from. Every source fact must be covered by at least one consolidated \
fact. Do not invent indices outside the numbered list.";

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractFactsSchema {
  facts: Vec<String>,
}

#[derive(Default)]
pub struct OpenAiCompletions;

#[async_trait]
impl CompletionsService for OpenAiCompletions {
  async fn extract_facts(
    &self,
    document_content: &str,
    speaker: &str,
  ) -> Result<crate::traits::ExtractFactsOutput, AppError> {
    let user_content = format!("Speaker: {speaker}\n\nDocument:\n{document_content}");

    let system = ChatCompletionRequestSystemMessage::from(EXTRACT_SYSTEM_PROMPT);
    let user = ChatCompletionRequestUserMessage::from(user_content);

    let output = generate_structured::<ExtractFactsSchema>(
      vec![
        ChatCompletionRequestMessage::System(system),
        ChatCompletionRequestMessage::User(user),
      ],
      "extract_facts".to_owned(),
      Some("Extract discrete facts attributable to a speaker".to_owned()),
    )
    .await?;

    Ok(crate::traits::ExtractFactsOutput { facts: output.facts })
  }

  async fn decide_action(
    &self,
    new_fact: &str,
    candidates: &[CandidateFact],
  ) -> Result<ActionChoice, AppError> {
    let mut candidates_section = String::new();
    if candidates.is_empty() {
      candidates_section.push_str("No existing candidates.");
    } else {
      for candidate in candidates {
        let _ = writeln!(candidates_section, "- [fact_id: {}] {}", candidate.id, candidate.content);
      }
    }

    let user_content = format!("New fact: {new_fact}\n\nExisting candidates:\n{candidates_section}");

    let system = ChatCompletionRequestSystemMessage::from(DECIDE_SYSTEM_PROMPT);
    let user = ChatCompletionRequestUserMessage::from(user_content);

    generate_structured::<ActionChoice>(
      vec![
        ChatCompletionRequestMessage::System(system),
        ChatCompletionRequestMessage::User(user),
      ],
      "decide_memory_action".to_owned(),
      Some("Decide how a new fact should update the memory store".to_owned()),
    )
    .await
  }

  async fn consolidate(
    &self,
    facts: &[(usize, String)],
    topic_hint: Option<&str>,
  ) -> Result<ConsolidationOutput, AppError> {
    let mut facts_section = String::new();
    for (index, content) in facts {
      let _ = writeln!(facts_section, "{index}. {content}");
    }

    let mut user_content = format!("Facts:\n{facts_section}");
    if let Some(topic) = topic_hint {
      let _ = writeln!(user_content, "\nTopic hint: {topic}");
    }

    let system = ChatCompletionRequestSystemMessage::from(CONSOLIDATION_SYSTEM_PROMPT);
    let user = ChatCompletionRequestUserMessage::from(user_content);

    generate_structured::<ConsolidationOutput>(
      vec![
        ChatCompletionRequestMessage::System(system),
        ChatCompletionRequestMessage::User(user),
      ],
      "consolidate_facts".to_owned(),
      Some("Merge related facts into a smaller, clearer set".to_owned()),
    )
    .await
  }
}
