use crate::error::ClassifyError;
use moka::sync::Cache;
use providers::{EmbeddingProvider, ProviderError};
use std::sync::Arc;
use tracing::debug;

/// Embedding front-end with a bounded memo of recent texts.
///
/// Keys are blake3 hashes of the text, so the cache never holds message bodies.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Cache<String, Arc<Vec<f32>>>,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache_size: u64, batch_size: usize) -> Self {
        Self {
            provider,
            cache: Cache::new(cache_size),
            batch_size: batch_size.max(1),
        }
    }

    fn key(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    pub async fn embed_one(&self, text: &str) -> Result<Arc<Vec<f32>>, ClassifyError> {
        let mut out = self.embed_many(&[text.to_string()]).await?;
        out.pop().ok_or_else(|| {
            ClassifyError::ModelUnavailable(ProviderError::InvalidResponse(
                "provider returned no embedding".into(),
            ))
        })
    }

    /// Embeds `texts` in order, calling the provider only for cache misses.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Arc<Vec<f32>>>, ClassifyError> {
        let keys: Vec<String> = texts.iter().map(|t| Self::key(t)).collect();
        let mut slots: Vec<Option<Arc<Vec<f32>>>> = keys.iter().map(|k| self.cache.get(k)).collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| slots[i].is_none()).collect();
        if !missing.is_empty() {
            debug!("embedding cache: {} hits, {} misses", texts.len() - missing.len(), missing.len());
        }

        for batch in missing.chunks(self.batch_size) {
            let batch_texts: Vec<String> = batch.iter().map(|&i| texts[i].clone()).collect();
            let resp = self.provider.embed(&batch_texts).await?;
            if resp.vectors.len() != batch.len() {
                return Err(ClassifyError::ModelUnavailable(ProviderError::InvalidResponse(
                    format!(
                        "provider returned {} vectors for {} texts",
                        resp.vectors.len(),
                        batch.len()
                    ),
                )));
            }
            for (&i, vector) in batch.iter().zip(resp.vectors) {
                let vector = Arc::new(vector);
                self.cache.insert(keys[i].clone(), vector.clone());
                slots[i] = Some(vector);
            }
        }

        // Every slot was either a hit or filled from the provider above.
        Ok(slots.into_iter().flatten().collect())
    }
}
