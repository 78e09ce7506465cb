//! Local sentence-embedding model (e.g. all-MiniLM-L6-v2) run through ONNX Runtime.
//!
//! Needs the exported `model.onnx` and the matching `tokenizer.json`. The runtime library is
//! loaded at startup from `ORT_DYLIB_PATH`.

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::debug;

/// Sentence models are trained on short inputs; longer bodies are truncated.
const MAX_TOKENS: usize = 256;

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    pub model_path: String,
    pub tokenizer_path: String,
    pub threads: usize,
}

#[derive(Clone)]
pub struct OnnxProvider {
    inner: Arc<Inner>,
}

struct Inner {
    // `Session::run` takes `&mut self`.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

fn load_failed(path: &str, reason: impl std::fmt::Display) -> ProviderError {
    ProviderError::RequestFailed(format!("loading {path}: {reason}"))
}

impl OnnxProvider {
    pub fn load(cfg: &OnnxConfig) -> Result<Self, ProviderError> {
        for path in [&cfg.model_path, &cfg.tokenizer_path] {
            if !Path::new(path).exists() {
                return Err(load_failed(path, "file not found"));
            }
        }

        let tokenizer = Tokenizer::from_file(&cfg.tokenizer_path)
            .map_err(|e| load_failed(&cfg.tokenizer_path, e))?;
        let session = Session::builder()
            .map_err(|e| load_failed(&cfg.model_path, e))?
            .with_intra_threads(cfg.threads.max(1))
            .map_err(|e| load_failed(&cfg.model_path, e))?
            .commit_from_file(&cfg.model_path)
            .map_err(|e| load_failed(&cfg.model_path, e))?;

        debug!(model = %cfg.model_path, "ONNX sentence model loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                tokenizer,
            }),
        })
    }
}

impl Inner {
    fn infer(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ProviderError::InvalidResponse(format!("tokenizer: {e}")))?;
        let len = encoding.get_ids().len().min(MAX_TOKENS);
        if len == 0 {
            return Err(ProviderError::InvalidResponse("tokenizer produced no tokens".into()));
        }
        let to_i64 = |xs: &[u32]| xs[..len].iter().map(|&x| x as i64).collect::<Vec<i64>>();
        let tensor = |values: Vec<i64>| {
            Tensor::from_array((vec![1i64, len as i64], values))
                .map_err(|e| ProviderError::InvalidResponse(format!("tensor: {e}")))
        };
        let ids = tensor(to_i64(encoding.get_ids()))?;
        let mask = tensor(to_i64(encoding.get_attention_mask()))?;
        let types = tensor(to_i64(encoding.get_type_ids()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ProviderError::RequestFailed(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => types
            ])
            .map_err(|e| ProviderError::RequestFailed(format!("inference: {e}")))?;
        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("model produced no output".into()))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ProviderError::InvalidResponse(format!("output tensor: {e}")))?;

        let pooled = match shape.len() {
            // [1, seq, dims]: mean over tokens.
            3 => {
                let seq = shape[1] as usize;
                let dims = shape[2] as usize;
                let mut pooled = vec![0.0f32; dims];
                for token in data.chunks(dims).take(seq) {
                    for (acc, v) in pooled.iter_mut().zip(token) {
                        *acc += v;
                    }
                }
                pooled.iter_mut().for_each(|v| *v /= seq.max(1) as f32);
                pooled
            }
            // [1, dims]: already pooled.
            2 => data[..shape[1] as usize].to_vec(),
            _ => {
                return Err(ProviderError::InvalidResponse(format!(
                    "unexpected output shape {shape:?}"
                )))
            }
        };
        Ok(l2_normalize(pooled))
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait::async_trait]
impl EmbeddingProvider for OnnxProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let inner = self.inner.clone();
        let texts = texts.to_vec();
        // Inference is CPU-bound; keep it off the async workers.
        let vectors = tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|t| inner.infer(t))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| ProviderError::RequestFailed(format!("inference task: {e}")))??;
        Ok(EmbedResponse { vectors })
    }
}
