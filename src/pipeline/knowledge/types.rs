use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::KnowledgeError;

pub const DEFAULT_CLASS_NAME: &str = "TCMKnowledge";
pub const DEFAULT_QUERY_LIMIT: usize = 5;
pub const MAX_QUERY_LIMIT: usize = 50;

/// A passage to index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl KnowledgeEntry {
    pub fn new(text: impl Into<String>, title: Option<String>) -> Self {
        Self {
            text: text.into(),
            title,
        }
    }

    /// Label used when listing which passages fed a report.
    pub fn label(&self) -> String {
        label_for(self.title.as_deref(), &self.text)
    }
}

/// A retrieved passage with the store's similarity score, when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certainty: Option<f64>,
}

impl KnowledgeMatch {
    pub fn label(&self) -> String {
        label_for(self.title.as_deref(), &self.text)
    }
}

/// How a query is matched against stored passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Semantic similarity computed by the store's vectorizer.
    #[default]
    NearText,
    /// Wildcard match on text and title.
    Keyword,
}

/// Clamp a caller-supplied limit into `1..=MAX_QUERY_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_QUERY_LIMIT)
        .clamp(1, MAX_QUERY_LIMIT)
}

fn label_for(title: Option<&str>, text: &str) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => text.chars().take(60).collect(),
    }
}

/// Storage and similarity search for knowledge passages.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Create the backing collection if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), KnowledgeError>;

    /// Index a passage, returning the store's id for it.
    async fn index(&self, entry: &KnowledgeEntry) -> Result<String, KnowledgeError>;

    /// Up to `limit` passages matching `query`, best first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<KnowledgeMatch>, KnowledgeError>;

    /// Short backend name for health output.
    fn backend(&self) -> &'static str;
}
