//! Phishing decision procedure: semantic distance from known-safe content,
//! amplified by suspicious phrasing, with a shortcut for whitelisted links.

use crate::config::ClassificationConfig;
use crate::corpus::ReferenceCorpus;
use crate::embeddings::Embedder;
use crate::error::ClassifyError;
use crate::keywords::{KeywordMatcher, KeywordScan};
use crate::models::{ClosestReference, EmailInput, Label, Signals, Verdict};
use crate::scoring::{label_for, phishing_confidence};
use crate::text::{clean_text, extract_urls, link_host, registered_domain};
use std::sync::Arc;
use tracing::debug;

/// Confidence reported when every link in a message points at a trusted domain.
pub const WHITELISTED_CONFIDENCE: f32 = 0.01;

const PREVIEW_CHARS: usize = 80;

/// Stateless per request; share it behind an `Arc` across tasks.
pub struct Classifier {
    corpus: Arc<ReferenceCorpus>,
    embedder: Embedder,
    settings: ClassificationConfig,
    keywords: KeywordMatcher,
}

struct LinkFindings {
    urls: Vec<String>,
    trusted: Vec<String>,
    untrusted: Vec<String>,
}

impl LinkFindings {
    fn all_trusted(&self) -> bool {
        !self.urls.is_empty() && !self.trusted.is_empty() && self.untrusted.is_empty()
    }
}

impl Classifier {
    pub fn new(
        corpus: Arc<ReferenceCorpus>,
        embedder: Embedder,
        settings: ClassificationConfig,
    ) -> anyhow::Result<Self> {
        let keywords = KeywordMatcher::new(&settings.keywords)?;
        Ok(Self {
            corpus,
            embedder,
            settings,
            keywords,
        })
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    pub fn settings(&self) -> &ClassificationConfig {
        &self.settings
    }

    pub async fn classify_input(&self, input: &EmailInput) -> Result<Verdict, ClassifyError> {
        self.classify(&input.body).await
    }

    pub async fn classify(&self, body: &str) -> Result<Verdict, ClassifyError> {
        let cleaned = clean_text(body);
        if cleaned.is_empty() {
            return Err(ClassifyError::InvalidInput(
                "email body is empty after removing markup and symbols".into(),
            ));
        }

        let links = self.inspect_links(body);
        if self.settings.trust_whitelisted_links && links.all_trusted() {
            debug!("all {} links whitelisted, skipping model", links.urls.len());
            return Ok(Verdict {
                label: Label::Safe,
                confidence: WHITELISTED_CONFIDENCE,
                explanation: format!(
                    "All linked domains are whitelisted: {}",
                    links.trusted.join(", ")
                ),
                signals: Signals {
                    urls: links.urls,
                    trusted_domains: links.trusted,
                    ..Default::default()
                },
            });
        }

        let embedding = self.embedder.embed_one(&cleaned).await?;
        let best = self.corpus.best_match(&embedding)?;
        let scan = self.keywords.scan(&cleaned);

        let confidence = phishing_confidence(
            best.score,
            scan.score,
            self.settings.keyword_boost_factor,
        );
        let label = label_for(
            confidence,
            self.settings.low_threshold,
            self.settings.high_threshold,
        );
        let closest = ClosestReference {
            text: best.entry.text.clone(),
            similarity: best.score,
        };
        let explanation = explain(label, &closest, &scan, &links, self.keywords.category_count());
        debug!(
            "verdict {} confidence {:.3} (semantic {:.3}, keywords {:.3})",
            label.as_str(),
            confidence,
            best.score,
            scan.score
        );

        Ok(Verdict {
            label,
            confidence,
            explanation,
            signals: Signals {
                semantic_score: best.score,
                keyword_score: scan.score,
                matched_keywords: scan.matches,
                closest_reference: Some(closest),
                urls: links.urls,
                trusted_domains: links.trusted,
                untrusted_domains: links.untrusted,
            },
        })
    }

    fn inspect_links(&self, body: &str) -> LinkFindings {
        let urls = extract_urls(body);
        let mut trusted = Vec::new();
        let mut untrusted = Vec::new();
        for url in &urls {
            let domain = registered_domain(url).unwrap_or_else(|| url.to_lowercase());
            let trusted_host = link_host(url).map_or(false, |h| self.corpus.is_trusted_host(&h));
            let bucket = if trusted_host {
                &mut trusted
            } else {
                &mut untrusted
            };
            if !bucket.contains(&domain) {
                bucket.push(domain);
            }
        }
        LinkFindings {
            urls,
            trusted,
            untrusted,
        }
    }
}

fn explain(
    label: Label,
    closest: &ClosestReference,
    scan: &KeywordScan,
    links: &LinkFindings,
    category_count: usize,
) -> String {
    let reference_line = format!(
        "Closest known-safe reference (similarity {:.2}): \"{}\"",
        closest.similarity,
        preview(&closest.text)
    );
    let keyword_line = (!scan.is_empty()).then(|| {
        format!(
            "Suspicious keywords: {} ({} of {} categories)",
            scan.phrases().join(", "),
            scan.matches.len(),
            category_count
        )
    });

    let mut lines = Vec::new();
    match (label, keyword_line) {
        (Label::Safe, keyword_line) => {
            lines.push(reference_line);
            lines.extend(keyword_line);
        }
        (_, Some(keyword_line)) => {
            lines.push(keyword_line);
            lines.push(reference_line);
        }
        (_, None) => {
            lines.push(format!(
                "Low similarity to known-safe content ({:.2})",
                closest.similarity
            ));
            lines.push(reference_line);
        }
    }

    if links.urls.is_empty() {
        lines.push("No URLs detected.".to_string());
    } else {
        lines.push(format!("URLs found: {}", links.urls.join(", ")));
        if !links.untrusted.is_empty() {
            lines.push(format!(
                "Non-whitelisted domains: {}",
                links.untrusted.join(", ")
            ));
        }
    }
    lines.join("\n")
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}
