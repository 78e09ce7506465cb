use phishguard_core::corpus::ReferenceCorpus;
use phishguard_core::Verdict;
use std::collections::HashSet;

pub fn render_text(verdict: &Verdict) -> String {
    format!(
        "{}\nConfidence: {}%\n{}",
        verdict.label,
        verdict.confidence_percent(),
        verdict.explanation
    )
}

pub fn verdict_json(verdict: &Verdict, fields: &[String]) -> anyhow::Result<serde_json::Value> {
    let value = serde_json::to_value(verdict)?;
    Ok(filter_fields(value, fields))
}

/// Keeps only the requested top-level keys (case-insensitive). Empty list keeps everything.
pub fn filter_fields(mut value: serde_json::Value, fields: &[String]) -> serde_json::Value {
    if fields.is_empty() {
        return value;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    if let Some(obj) = value.as_object_mut() {
        obj.retain(|k, _| want.contains(&k.to_lowercase()));
    }
    value
}

pub fn corpus_summary(corpus: &ReferenceCorpus, provider: &str) -> serde_json::Value {
    serde_json::json!({
        "provider": provider,
        "entries": corpus.entries().len(),
        "dimension": corpus.dimension(),
        "trusted_domains": corpus.domain_count(),
    })
}
