use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::corpus::ReferenceCorpus;
use crate::embeddings::Embedder;
use anyhow::Context;
use providers::hashing::HashingProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_embedding(
        "hashing",
        Arc::new(HashingProvider::new(config.embeddings.dimensions)),
    );

    if let (Some(key), Some(base)) = (
        std::env::var_os("OPENAI_API_KEY"),
        std::env::var_os("OPENAI_BASE_URL"),
    ) {
        match OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base.to_string_lossy().into_owned(),
            embedding_model: config.embeddings.model.clone(),
            timeout: Duration::from_secs(config.embeddings.timeout_secs),
        }) {
            Ok(provider) => reg = reg.with_embedding("openai", Arc::new(provider)),
            Err(e) => warn!("OpenAI provider disabled: {}", e),
        }
    }

    if let (Some(model), Some(tokenizer)) = (
        &config.embeddings.model_path,
        &config.embeddings.tokenizer_path,
    ) {
        reg = register_onnx(reg, config, model, tokenizer);
    }

    reg.set_preferred_embedding(&config.embeddings.provider)
}

#[cfg(feature = "onnx")]
fn register_onnx(
    reg: ProviderRegistry,
    config: &AppConfig,
    model: &str,
    tokenizer: &str,
) -> ProviderRegistry {
    use providers::onnx::{OnnxConfig, OnnxProvider};
    match OnnxProvider::load(&OnnxConfig {
        model_path: model.to_string(),
        tokenizer_path: tokenizer.to_string(),
        threads: config.embeddings.threads,
    }) {
        Ok(provider) => reg.with_embedding("onnx", Arc::new(provider)),
        Err(e) => {
            warn!("ONNX provider disabled: {}", e);
            reg
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn register_onnx(
    reg: ProviderRegistry,
    _config: &AppConfig,
    model: &str,
    _tokenizer: &str,
) -> ProviderRegistry {
    warn!("embeddings.model_path {} ignored: built without the onnx feature", model);
    reg
}

pub fn build_embedder(config: &AppConfig, registry: &ProviderRegistry) -> anyhow::Result<Embedder> {
    let provider = registry.embedding(None).with_context(|| {
        format!(
            "embedding provider '{}' (available: {})",
            config.embeddings.provider,
            registry.embedding_names().join(", ")
        )
    })?;
    info!("Using embedding provider '{}'", config.embeddings.provider);
    Ok(Embedder::new(
        provider,
        config.embeddings.cache_size,
        config.embeddings.batch_size,
    ))
}

/// Startup path: provider selection, corpus embedding and validation.
pub async fn build_classifier(config: &AppConfig) -> anyhow::Result<Classifier> {
    let registry = build_registry(config);
    build_classifier_with(config, &registry).await
}

pub async fn build_classifier_with(
    config: &AppConfig,
    registry: &ProviderRegistry,
) -> anyhow::Result<Classifier> {
    config.validate()?;
    let embedder = build_embedder(config, registry)?;
    let corpus = ReferenceCorpus::load(&config.corpus, &embedder)
        .await
        .context("loading reference corpus")?;
    Classifier::new(Arc::new(corpus), embedder, config.classification.clone())
}
