//! Suspicious phrase detection over normalised email text.

use crate::config::KeywordCategory;
use regex::Regex;
use std::collections::BTreeMap;

struct CompiledCategory {
    name: String,
    pattern: Regex,
}

pub struct KeywordMatcher {
    categories: Vec<CompiledCategory>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordScan {
    pub matches: BTreeMap<String, Vec<String>>,
    /// Fraction of categories with at least one hit.
    pub score: f32,
}

impl KeywordScan {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// All matched phrases, in category order.
    pub fn phrases(&self) -> Vec<&str> {
        self.matches
            .values()
            .flat_map(|v| v.iter().map(String::as_str))
            .collect()
    }
}

impl KeywordMatcher {
    pub fn new(categories: &[KeywordCategory]) -> anyhow::Result<Self> {
        let mut compiled = Vec::with_capacity(categories.len());
        for cat in categories {
            let mut phrases: Vec<String> = cat
                .phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            // Longest first so "click here" wins over "click".
            phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            phrases.dedup();
            if phrases.is_empty() {
                anyhow::bail!("keyword category '{}' has no phrases", cat.name);
            }
            let alternation = phrases
                .iter()
                .map(|p| {
                    p.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!(r"\b(?:{alternation})\b"))?;
            compiled.push(CompiledCategory {
                name: cat.name.clone(),
                pattern,
            });
        }
        Ok(Self {
            categories: compiled,
        })
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Scans text that has already been through [`crate::text::clean_text`].
    pub fn scan(&self, cleaned: &str) -> KeywordScan {
        let mut matches: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut hit_categories = 0usize;
        for cat in &self.categories {
            let mut found: Vec<String> = Vec::new();
            for m in cat.pattern.find_iter(cleaned) {
                let phrase = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                if !found.contains(&phrase) {
                    found.push(phrase);
                }
            }
            if !found.is_empty() {
                hit_categories += 1;
                matches.entry(cat.name.clone()).or_default().extend(found);
            }
        }
        let score = if self.categories.is_empty() {
            0.0
        } else {
            hit_categories as f32 / self.categories.len() as f32
        };
        KeywordScan { matches, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_keywords;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&default_keywords()).unwrap()
    }

    #[test]
    fn no_keywords_scores_zero() {
        let scan = matcher().scan("see you at the team lunch on friday");
        assert!(scan.is_empty());
        assert_eq!(scan.score, 0.0);
    }

    #[test]
    fn categories_are_counted_once() {
        let scan = matcher().scan("urgent: verify your account now or it will be suspended");
        assert_eq!(scan.matches.len(), 3);
        assert!((scan.score - 0.6).abs() < 1e-6);
        assert_eq!(scan.matches["account"], vec!["account", "suspended"]);
        assert_eq!(scan.matches["credentials"], vec!["verify"]);
        assert_eq!(scan.matches["urgency"], vec!["urgent"]);
    }

    #[test]
    fn matches_respect_word_boundaries() {
        let scan = matcher().scan("the accounting team updated the spreadsheet");
        assert!(scan.is_empty(), "{:?}", scan.matches);
    }

    #[test]
    fn multi_word_phrases_tolerate_line_breaks() {
        let scan = matcher().scan("please click\n  here to continue");
        assert_eq!(scan.matches["call_to_action"], vec!["click here"]);
    }

    #[test]
    fn empty_category_list_scores_zero() {
        let m = KeywordMatcher::new(&[]).unwrap();
        assert_eq!(m.category_count(), 0);
        assert_eq!(m.scan("urgent").score, 0.0);
    }

    #[test]
    fn blank_category_is_rejected() {
        let cats = vec![KeywordCategory::new("blank", &["  "])];
        assert!(KeywordMatcher::new(&cats).is_err());
    }

    #[test]
    fn phrases_flatten_in_category_order() {
        let scan = matcher().scan("urgent payment needed");
        assert_eq!(scan.phrases(), vec!["payment", "urgent"]);
    }
}
