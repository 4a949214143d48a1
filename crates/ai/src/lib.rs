// Re-export async_openai message types for consumers building prompts.
pub use async_openai::types::chat::{
  ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
  ChatCompletionRequestUserMessage,
};

mod cosine_similarity;
pub use cosine_similarity::cosine_similarity;

mod schema;

mod traits;
pub use traits::{
  ActionChoice, CompletionsService, ConsolidatedFactOut, ConsolidationOutput, EmbeddingsService,
  ExtractFactsOutput,
};

mod openai_completions;
pub use openai_completions::OpenAiCompletions;

mod openai_embeddings;
pub use openai_embeddings::OpenAiEmbeddings;
