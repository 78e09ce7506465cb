//! Known-safe reference corpus, built once at startup and read-only afterwards.

use crate::config::CorpusConfig;
use crate::embeddings::Embedder;
use crate::error::ClassifyError;
use crate::models::ReferenceEntry;
use crate::scoring::cosine_similarity;
use crate::text::{clean_text, normalize_domain};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_SAFE_TEXTS: &[&str] = &[
    "Hi team, attached are the meeting notes from this week's planning session.",
    "Thanks for your order! Your package has shipped and will arrive on Thursday.",
    "Reminder: the quarterly all-hands is scheduled for Friday at 10am in the main hall.",
    "Here is the monthly newsletter with product news and upcoming community events.",
    "Happy birthday! Hope you have a wonderful day with family and friends.",
    "Can we move our lunch to next Tuesday? Something came up on my calendar.",
    "Please find the draft report for review. Comments are welcome before Monday.",
];

pub const DEFAULT_SAFE_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com"];

#[derive(Debug, Clone)]
pub struct ReferenceCorpus {
    entries: Vec<ReferenceEntry>,
    domains: HashSet<String>,
    dimension: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BestMatch<'a> {
    pub entry: &'a ReferenceEntry,
    /// Cosine similarity clamped to [0, 1].
    pub score: f32,
}

impl ReferenceCorpus {
    /// Builds the corpus from configuration, embedding every reference text once.
    pub async fn load(cfg: &CorpusConfig, embedder: &Embedder) -> Result<Self, ClassifyError> {
        let mut raw_texts: Vec<String> = cfg.texts.clone();
        if let Some(path) = &cfg.texts_path {
            raw_texts.extend(read_list(Path::new(path))?);
        }
        if raw_texts.is_empty() {
            raw_texts = DEFAULT_SAFE_TEXTS.iter().map(|s| s.to_string()).collect();
        }

        let mut raw_domains: Vec<String> = cfg.domains.clone();
        if let Some(path) = &cfg.domains_path {
            raw_domains.extend(read_list(Path::new(path))?);
        }
        if raw_domains.is_empty() {
            raw_domains = DEFAULT_SAFE_DOMAINS.iter().map(|s| s.to_string()).collect();
        }

        let texts = dedup_cleaned(&raw_texts);
        let domains: HashSet<String> = raw_domains
            .iter()
            .filter_map(|d| {
                let normalized = normalize_domain(d);
                if normalized.is_none() {
                    warn!("ignoring unparseable whitelist entry {:?}", d);
                }
                normalized
            })
            .collect();

        let vectors = embedder.embed_many(&texts).await?;
        let entries: Vec<ReferenceEntry> = texts
            .into_iter()
            .zip(vectors)
            .map(|(text, embedding)| ReferenceEntry {
                text,
                embedding: embedding.to_vec(),
            })
            .collect();

        let corpus = Self::from_entries(entries, domains)?;
        info!(
            "Reference corpus loaded: {} entries, {} trusted domains, dimension {}",
            corpus.entries.len(),
            corpus.domains.len(),
            corpus.dimension
        );
        Ok(corpus)
    }

    /// Validates precomputed entries: non-empty, one shared non-zero dimension.
    pub fn from_entries(
        entries: Vec<ReferenceEntry>,
        domains: HashSet<String>,
    ) -> Result<Self, ClassifyError> {
        let first = entries.first().ok_or(ClassifyError::EmptyCorpus)?;
        let dimension = first.embedding.len();
        if dimension == 0 {
            return Err(ClassifyError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(ClassifyError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self {
            entries,
            domains,
            dimension,
        })
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// True when `host` is a whitelisted name or a subdomain of one.
    pub fn is_trusted_host(&self, host: &str) -> bool {
        let mut rest = host;
        loop {
            if self.domains.contains(rest) {
                return true;
            }
            match rest.split_once('.') {
                Some((_, parent)) => rest = parent,
                None => return false,
            }
        }
    }

    /// Most similar entry to `embedding`. First entry wins ties.
    pub fn best_match(&self, embedding: &[f32]) -> Result<BestMatch<'_>, ClassifyError> {
        if embedding.len() != self.dimension {
            return Err(ClassifyError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        let mut best: Option<BestMatch<'_>> = None;
        for entry in &self.entries {
            let score = cosine_similarity(embedding, &entry.embedding).clamp(0.0, 1.0);
            if best.map_or(true, |b| score > b.score) {
                best = Some(BestMatch { entry, score });
            }
        }
        // from_entries guarantees at least one entry.
        best.ok_or(ClassifyError::EmptyCorpus)
    }
}

fn read_list(path: &Path) -> Result<Vec<String>, ClassifyError> {
    let content = std::fs::read_to_string(path).map_err(|source| ClassifyError::Corpus {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn dedup_cleaned(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|t| clean_text(t))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
