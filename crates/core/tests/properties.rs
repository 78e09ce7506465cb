use once_cell::sync::Lazy;
use phishguard_core::config::{default_keywords, AppConfig, ClassificationConfig};
use phishguard_core::corpus::ReferenceCorpus;
use phishguard_core::embeddings::Embedder;
use phishguard_core::models::ReferenceEntry;
use phishguard_core::scoring::phishing_confidence;
use phishguard_core::{pipeline, Classifier, ClassifyError};
use proptest::prelude::*;
use providers::{EmbedResponse, EmbeddingProvider, ProviderError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Runtime;

static RT: Lazy<Runtime> = Lazy::new(|| Runtime::new().unwrap());

static DEFAULT: Lazy<Classifier> =
    Lazy::new(|| RT.block_on(pipeline::build_classifier(&AppConfig::default())).unwrap());

/// Same vector for every text, pinning the semantic score.
struct ConstantProvider(Vec<f32>);

#[async_trait::async_trait]
impl EmbeddingProvider for ConstantProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Ok(EmbedResponse {
            vectors: vec![self.0.clone(); texts.len()],
        })
    }
}

static PINNED: Lazy<Classifier> = Lazy::new(|| {
    let corpus = ReferenceCorpus::from_entries(
        vec![ReferenceEntry {
            text: "reference".into(),
            embedding: vec![1.0, 0.0],
        }],
        HashSet::new(),
    )
    .unwrap();
    Classifier::new(
        Arc::new(corpus),
        Embedder::new(Arc::new(ConstantProvider(vec![0.8, 0.6])), 0, 8),
        ClassificationConfig {
            keyword_boost_factor: 0.5,
            ..Default::default()
        },
    )
    .unwrap()
});

/// First phrase of every default keyword category.
fn category_phrases() -> Vec<String> {
    default_keywords()
        .into_iter()
        .map(|c| c.phrases[0].clone())
        .collect()
}

fn body_with(base: &str, include: &[bool]) -> String {
    let mut body = base.to_string();
    for (phrase, on) in category_phrases().iter().zip(include) {
        if *on {
            body.push(' ');
            body.push_str(phrase);
        }
    }
    body
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn confidence_is_bounded(body in ".{0,300}") {
        match RT.block_on(DEFAULT.classify(&body)) {
            Ok(v) => {
                prop_assert!((0.0..=1.0).contains(&v.confidence), "{}", v.confidence);
                prop_assert!((0.0..=1.0).contains(&v.signals.semantic_score));
                prop_assert!((0.0..=1.0).contains(&v.signals.keyword_score));
            }
            Err(ClassifyError::InvalidInput(_)) => {}
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }

    #[test]
    fn more_keyword_categories_never_lower_confidence(
        base in "[a-z ]{1,40}",
        include in proptest::collection::vec(any::<bool>(), 5),
        extra in 0usize..5,
    ) {
        let mut superset = include.clone();
        superset[extra] = true;
        let fewer = RT.block_on(PINNED.classify(&body_with(&format!("note {base}"), &include))).unwrap();
        let more = RT.block_on(PINNED.classify(&body_with(&format!("note {base}"), &superset))).unwrap();
        prop_assert!((fewer.signals.semantic_score - more.signals.semantic_score).abs() < 1e-6);
        prop_assert!(more.signals.keyword_score >= fewer.signals.keyword_score);
        prop_assert!(more.confidence >= fewer.confidence);
    }

    #[test]
    fn formula_is_bounded_and_monotonic(
        semantic in -2.0f32..2.0,
        k1 in 0.0f32..1.0,
        k2 in 0.0f32..1.0,
        boost in 0.0f32..5.0,
    ) {
        let (lo, hi) = if k1 <= k2 { (k1, k2) } else { (k2, k1) };
        let a = phishing_confidence(semantic, lo, boost);
        let b = phishing_confidence(semantic, hi, boost);
        prop_assert!((0.0..=1.0).contains(&a));
        prop_assert!((0.0..=1.0).contains(&b));
        prop_assert!(b >= a);
    }

    #[test]
    fn higher_similarity_never_raises_confidence(
        s1 in 0.0f32..1.0,
        s2 in 0.0f32..1.0,
        keyword in 0.0f32..1.0,
    ) {
        let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
        prop_assert!(phishing_confidence(hi, keyword, 1.0) <= phishing_confidence(lo, keyword, 1.0));
    }
}
