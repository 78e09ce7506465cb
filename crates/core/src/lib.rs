//! Core library: text normalisation, embeddings, reference corpus, phishing classification.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod keywords;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod text;

pub use classifier::Classifier;
pub use error::ClassifyError;
pub use models::{EmailInput, Label, Verdict};
