use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Vector size of the offline hashing provider.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Exported sentence model and its `tokenizer.json`, for the `onnx` provider.
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub tokenizer_path: Option<String>,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            cache_size: default_cache_size(),
            timeout_secs: default_timeout_secs(),
            model_path: None,
            tokenizer_path: None,
            threads: default_threads(),
        }
    }
}

/// Known-safe reference content. Inline lists and files are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub texts_path: Option<String>,
    #[serde(default)]
    pub domains_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,
    #[serde(default = "default_keyword_boost_factor")]
    pub keyword_boost_factor: f32,
    /// Short-circuit to safe when every link in the body points at a trusted domain.
    #[serde(default = "default_true")]
    pub trust_whitelisted_links: bool,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<KeywordCategory>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            low_threshold: default_low_threshold(),
            keyword_boost_factor: default_keyword_boost_factor(),
            trust_whitelisted_links: true,
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub phrases: Vec<String>,
}

impl KeywordCategory {
    pub fn new(name: &str, phrases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn default_provider() -> String {
    "hashing".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

fn default_cache_size() -> u64 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_threads() -> usize {
    2
}

fn default_high_threshold() -> f32 {
    0.75
}

fn default_low_threshold() -> f32 {
    0.45
}

fn default_keyword_boost_factor() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

pub fn default_keywords() -> Vec<KeywordCategory> {
    vec![
        KeywordCategory::new(
            "urgency",
            &[
                "urgent",
                "immediately",
                "limited time",
                "action required",
                "within 24 hours",
                "final notice",
            ],
        ),
        KeywordCategory::new(
            "credentials",
            &["verify", "password", "login", "confirm", "otp", "reset"],
        ),
        KeywordCategory::new(
            "account",
            &[
                "account", "security", "alert", "access", "update", "locked", "blocked",
                "suspended",
            ],
        ),
        KeywordCategory::new(
            "payment",
            &["bank", "payment", "refund", "invoice", "wire transfer", "gift card"],
        ),
        KeywordCategory::new("call_to_action", &["click", "click here", "open the attachment"]),
    ]
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.classification;
        for (name, v) in [
            ("high_threshold", c.high_threshold),
            ("low_threshold", c.low_threshold),
            ("keyword_boost_factor", c.keyword_boost_factor),
        ] {
            if !v.is_finite() {
                anyhow::bail!("classification.{name} must be finite, got {v}");
            }
        }
        if !(0.0..=1.0).contains(&c.low_threshold) || !(0.0..=1.0).contains(&c.high_threshold) {
            anyhow::bail!("classification thresholds must lie in [0, 1]");
        }
        if c.low_threshold > c.high_threshold {
            anyhow::bail!(
                "classification.low_threshold ({}) exceeds high_threshold ({})",
                c.low_threshold,
                c.high_threshold
            );
        }
        if c.keyword_boost_factor < 0.0 {
            anyhow::bail!("classification.keyword_boost_factor must not be negative");
        }
        if let Some(cat) = c
            .keywords
            .iter()
            .find(|k| k.phrases.iter().all(|p| p.trim().is_empty()))
        {
            anyhow::bail!("keyword category '{}' has no phrases", cat.name);
        }
        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than zero");
        }
        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than zero");
        }
        if self.embeddings.timeout_secs == 0 {
            anyhow::bail!("embeddings.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("PHISHGUARD").separator("__"));
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}
