use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailInput {
    pub body: String,
}

impl EmailInput {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Safe,
    Suspicious,
    Phishing,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Suspicious => "suspicious",
            Label::Phishing => "phishing",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::Safe => "Safe Email",
            Label::Suspicious => "Suspicious Email",
            Label::Phishing => "Phishing Email",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestReference {
    pub text: String,
    pub similarity: f32,
}

/// Raw signals behind a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub semantic_score: f32,
    pub keyword_score: f32,
    /// Category name to the phrases found for it.
    pub matched_keywords: BTreeMap<String, Vec<String>>,
    pub closest_reference: Option<ClosestReference>,
    pub urls: Vec<String>,
    pub trusted_domains: Vec<String>,
    pub untrusted_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Certainty that the input is phishing, in [0, 1].
    pub confidence: f32,
    pub explanation: String,
    pub signals: Signals,
}

impl Verdict {
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}
