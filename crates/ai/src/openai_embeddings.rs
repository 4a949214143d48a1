use async_openai::{Client, config::OpenAIConfig, types::embeddings::CreateEmbeddingRequestArgs};
use async_trait::async_trait;
use corpusmem_shared::{APP_ENV, AppError};

use crate::traits::EmbeddingsService;

/// Target dimension every stored embedding is normalized to.
const TARGET_DIM: usize = 1024;
/// Threshold for determining if L2 normalization is needed.
const L2_NORM_TOLERANCE: f32 = 1e-6;

pub struct OpenAiEmbeddings {
  client: Client<OpenAIConfig>,
}

impl Default for OpenAiEmbeddings {
  fn default() -> Self {
    let config = OpenAIConfig::new()
      .with_api_key(&APP_ENV.openai_api_key)
      .with_api_base(&APP_ENV.openai_base_url);
    Self {
      client: Client::with_config(config),
    }
  }
}

#[async_trait]
impl EmbeddingsService for OpenAiEmbeddings {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
    let request = CreateEmbeddingRequestArgs::default()
      .model(&APP_ENV.openai_embedding_model)
      .input(text)
      .dimensions(TARGET_DIM as u32)
      .build()
      .map_err(AppError::new)?;

    let embedding = self
      .client
      .embeddings()
      .create(request)
      .await
      .map_err(AppError::new)?
      .data
      .into_iter()
      .map(|e| e.embedding)
      .next_back()
      .ok_or_else(|| AppError::new(anyhow::anyhow!("empty embedding")))?;

    process_embedding(embedding)
  }

  async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let request = CreateEmbeddingRequestArgs::default()
      .model(&APP_ENV.openai_embedding_model)
      .input(texts.to_vec())
      .dimensions(TARGET_DIM as u32)
      .build()
      .map_err(AppError::new)?;

    let response = self.client.embeddings().create(request).await.map_err(AppError::new)?;

    let mut by_index: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
    for entry in response.data {
      if let Some(slot) = by_index.get_mut(entry.index as usize) {
        *slot = Some(entry.embedding);
      }
    }

    by_index
      .into_iter()
      .map(|entry| process_embedding(entry.ok_or_else(|| AppError::new(anyhow::anyhow!("missing embedding in batch response")))?))
      .collect()
  }
}

/// Ensure an embedding vector is L2 normalized with exactly [`TARGET_DIM`] dimensions.
///
/// - If dim > TARGET_DIM: truncate and L2 normalize
/// - If dim == TARGET_DIM: normalize only if not already unit length
/// - If dim < TARGET_DIM: error
fn process_embedding(mut vec: Vec<f32>) -> Result<Vec<f32>, AppError> {
  match vec.len() {
    d if d > TARGET_DIM => {
      vec.truncate(TARGET_DIM);
      l2_normalize(&mut vec);
      Ok(vec)
    }
    d if d == TARGET_DIM => {
      let norm_sq: f32 = vec.iter().map(|x| x * x).sum();
      if (norm_sq - 1.0).abs() > L2_NORM_TOLERANCE {
        l2_normalize(&mut vec);
      }
      Ok(vec)
    }
    d => Err(AppError::new(anyhow::anyhow!(
      "embedding dimension {d} is less than required {TARGET_DIM}"
    ))),
  }
}

fn l2_normalize(vec: &mut [f32]) {
  let norm_sq: f32 = vec.iter().map(|x| x * x).sum();
  let norm = norm_sq.sqrt();
  if norm > 1e-12 {
    for x in vec.iter_mut() {
      *x /= norm;
    }
  }
}
