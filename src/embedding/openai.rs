//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, SleuthError};
use crate::llm::create_http_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder with shortened output dimensions.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for `text-embedding-3-small` reduced to 384 dimensions.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::from_settings(&EmbeddingSettings::default(), api_key)
    }

    /// Create an embedder from settings.
    pub fn from_settings(settings: &EmbeddingSettings, api_key: &str) -> Result<Self> {
        let config = OpenAIConfig::new()
            .with_api_base(&settings.api_base)
            .with_api_key(api_key);
        let http = create_http_client(Duration::from_secs(settings.timeout_seconds))?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http),
            model: settings.model.clone(),
            dimensions: settings.dimensions as usize,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SleuthError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| SleuthError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| SleuthError::Embedding(format!("Embedding API error: {}", e)))?;

            if response.data.len() != batch.len() {
                return Err(SleuthError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.data.len()
                )));
            }

            let mut data = response.data;
            data.sort_by_key(|e| e.index);

            for item in data {
                if item.embedding.len() != self.dimensions {
                    return Err(SleuthError::Embedding(format!(
                        "Model returned {} dimensions, expected {}",
                        item.embedding.len(),
                        self.dimensions
                    )));
                }
                all_embeddings.push(item.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EMBEDDING_DIMENSIONS;

    #[test]
    fn test_embedder_defaults_to_store_dimensions() {
        let embedder = OpenAIEmbedder::new("test-key").unwrap();
        assert_eq!(embedder.dimensions(), EMBEDDING_DIMENSIONS);
    }

    #[test]
    fn test_embedder_respects_settings() {
        let settings = EmbeddingSettings {
            dimensions: 512,
            ..EmbeddingSettings::default()
        };
        let embedder = OpenAIEmbedder::from_settings(&settings, "test-key").unwrap();
        assert_eq!(embedder.dimensions(), 512);
    }
}
